//! Single binary web server: JSON API over in-memory Swiss tournament sessions.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT, SESSION_DIR, INACTIVITY_HOURS.

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use swiss_tournament_web::{
    check_round_generation, commit_round, delete_round, export_session, import_roster,
    import_roster_strict, load_session_into, paste_winners, ranked_standings,
    seed_bracket_from_standings, set_notes, set_scores, set_winner, snapshot_file_name,
    start_next_round, PairingOptions, PlayerId, RosterFormat, ServerConfig, Session, SessionError,
    SessionId, WinnerChoice,
};

/// Per-session entry: session data + last activity time (for auto-cleanup).
struct SessionEntry {
    session: Session,
    last_activity: Instant,
}

type Sessions = RwLock<HashMap<SessionId, SessionEntry>>;
type AppState = Data<Sessions>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Deserialize)]
struct ImportRosterBody {
    text: String,
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    format: RosterFormat,
}

#[derive(Deserialize)]
struct DroppedBody {
    dropped: bool,
}

#[derive(Deserialize, Default)]
struct GenerateBody {
    #[serde(default)]
    allow_repeats: bool,
}

#[derive(Deserialize)]
struct WinnerBody {
    winner: WinnerChoice,
}

#[derive(Deserialize)]
struct ScoresBody {
    score_player1: f64,
    score_player2: f64,
}

#[derive(Deserialize)]
struct NotesBody {
    notes: String,
}

#[derive(Deserialize)]
struct TextBody {
    text: String,
}

#[derive(Deserialize)]
struct StandingsQuery {
    cutoff: Option<usize>,
}

#[derive(Deserialize)]
struct BracketQuery {
    top: Option<usize>,
}

#[derive(Deserialize)]
struct SessionPath {
    id: SessionId,
}

#[derive(Deserialize)]
struct PlayerPath {
    id: SessionId,
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct RoundPath {
    id: SessionId,
    round: usize,
}

#[derive(Deserialize)]
struct MatchupPath {
    id: SessionId,
    round: usize,
    matchup: usize,
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No session" }))
}

fn bad_request(e: SessionError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

/// Run `f` against a session (touching its activity time) and turn the result into a response.
fn with_session<T, F>(state: &Sessions, id: SessionId, f: F) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(&mut Session) -> Result<T, SessionError>,
{
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    match f(&mut entry.session) {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => bad_request(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "swiss-tournament-web",
    })
}

/// Create a new empty session (returns it with id; client stores id for subsequent requests).
#[post("/api/sessions")]
async fn api_create_session(state: AppState) -> HttpResponse {
    let session = Session::new();
    let id = session.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let body = HttpResponse::Ok().json(&session);
    g.insert(
        id,
        SessionEntry {
            session,
            last_activity: Instant::now(),
        },
    );
    log::info!("Created session {}", id);
    body
}

#[get("/api/sessions/{id}")]
async fn api_get_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| Ok(s.clone()))
}

#[post("/api/sessions/{id}/players")]
async fn api_add_player(state: AppState, path: Path<SessionPath>, body: Json<NameBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        s.add_player(body.name.as_str())?;
        Ok(s.clone())
    })
}

/// Import names, one per line (`"format": "csv"` takes the first CSV column instead).
/// Lenient by default; `strict` aborts on the first duplicate.
#[post("/api/sessions/{id}/players/import")]
async fn api_import_players(
    state: AppState,
    path: Path<SessionPath>,
    body: Json<ImportRosterBody>,
) -> HttpResponse {
    with_session(&state, path.id, |s| {
        if body.strict {
            let added = import_roster_strict(s, &body.text, body.format)?;
            Ok(serde_json::json!({ "added": added.len() }))
        } else {
            Ok(serde_json::json!(import_roster(s, &body.text, body.format)))
        }
    })
}

#[put("/api/sessions/{id}/players/{player_id}/dropped")]
async fn api_set_dropped(state: AppState, path: Path<PlayerPath>, body: Json<DroppedBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        s.set_dropped(path.player_id, body.dropped)?;
        Ok(s.clone())
    })
}

#[put("/api/sessions/{id}/players/{player_id}/name")]
async fn api_rename_player(state: AppState, path: Path<PlayerPath>, body: Json<NameBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        s.rename_player(path.player_id, &body.name)?;
        Ok(s.clone())
    })
}

/// Standings, best first. `?cutoff=N` only counts the first N rounds.
#[get("/api/sessions/{id}/standings")]
async fn api_standings(state: AppState, path: Path<SessionPath>, query: Query<StandingsQuery>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        Ok(ranked_standings(&s.players, &s.rounds, query.cutoff))
    })
}

/// Warnings (or the blocking error) the next generation would report.
#[get("/api/sessions/{id}/rounds/check")]
async fn api_check_round(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| check_round_generation(s))
}

#[post("/api/sessions/{id}/rounds/generate")]
async fn api_generate_round(
    state: AppState,
    path: Path<SessionPath>,
    body: Option<Json<GenerateBody>>,
) -> HttpResponse {
    let options = PairingOptions {
        allow_repeats: body.map(|b| b.allow_repeats).unwrap_or_default(),
    };
    with_session(&state, path.id, |s| {
        let start = start_next_round(s, &options)?;
        Ok(serde_json::json!({ "round": start, "session": s }))
    })
}

#[put("/api/sessions/{id}/rounds/{round}/matchups/{matchup}/winner")]
async fn api_set_winner(state: AppState, path: Path<MatchupPath>, body: Json<WinnerBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        set_winner(s, path.round, path.matchup, body.winner)?;
        Ok(s.clone())
    })
}

#[put("/api/sessions/{id}/rounds/{round}/matchups/{matchup}/scores")]
async fn api_set_scores(state: AppState, path: Path<MatchupPath>, body: Json<ScoresBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        set_scores(s, path.round, path.matchup, body.score_player1, body.score_player2)?;
        Ok(s.clone())
    })
}

#[put("/api/sessions/{id}/rounds/{round}/matchups/{matchup}/notes")]
async fn api_set_notes(state: AppState, path: Path<MatchupPath>, body: Json<NotesBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        set_notes(s, path.round, path.matchup, &body.notes)?;
        Ok(s.clone())
    })
}

#[post("/api/sessions/{id}/rounds/{round}/paste-winners")]
async fn api_paste_winners(state: AppState, path: Path<RoundPath>, body: Json<TextBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let updated = paste_winners(s, path.round, &body.text)?;
        Ok(serde_json::json!({ "updated": updated, "session": s }))
    })
}

#[post("/api/sessions/{id}/rounds/{round}/commit")]
async fn api_commit_round(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        commit_round(s, path.round)?;
        Ok(s.clone())
    })
}

#[delete("/api/sessions/{id}/rounds/{round}")]
async fn api_delete_round(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        delete_round(s, path.round)?;
        Ok(s.clone())
    })
}

/// First-round elimination bracket from the current standings (`?top=N` keeps the best N).
#[get("/api/sessions/{id}/bracket")]
async fn api_bracket(state: AppState, path: Path<SessionPath>, query: Query<BracketQuery>) -> HttpResponse {
    with_session(&state, path.id, |s| seed_bracket_from_standings(s, query.top))
}

/// Session in the on-disk file format.
#[get("/api/sessions/{id}/export")]
async fn api_export(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let Some(entry) = g.get(&path.id) else {
        return not_found();
    };
    match export_session(&entry.session) {
        Ok(text) => HttpResponse::Ok()
            .content_type("application/json")
            .insert_header(("Content-Disposition", "attachment; filename=\"session.json\""))
            .body(text),
        Err(e) => bad_request(e),
    }
}

/// Replace the session contents with an uploaded file. A malformed file leaves the session as it was.
#[post("/api/sessions/{id}/import")]
async fn api_import(state: AppState, path: Path<SessionPath>, body: String) -> HttpResponse {
    with_session(&state, path.id, |s| {
        load_session_into(s, &body)?;
        Ok(s.clone())
    })
}

/// Write a timestamped snapshot of the session into SESSION_DIR.
#[post("/api/sessions/{id}/save")]
async fn api_save(state: AppState, config: Data<ServerConfig>, path: Path<SessionPath>) -> HttpResponse {
    let text = {
        let g = match state.read() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        let Some(entry) = g.get(&path.id) else {
            return not_found();
        };
        match export_session(&entry.session) {
            Ok(text) => text,
            Err(e) => return bad_request(e),
        }
    };
    let file = config
        .session_dir
        .join(snapshot_file_name(path.id, &chrono::Local::now()));
    if let Err(e) = tokio::fs::create_dir_all(&config.session_dir).await {
        log::error!("Cannot create {}: {}", config.session_dir.display(), e);
        return HttpResponse::InternalServerError().body("cannot create session directory");
    }
    match tokio::fs::write(&file, text).await {
        Ok(()) => {
            log::info!("Saved session {} to {}", path.id, file.display());
            HttpResponse::Ok().json(serde_json::json!({ "file": file.display().to_string() }))
        }
        Err(e) => {
            log::error!("Cannot write {}: {}", file.display(), e);
            HttpResponse::InternalServerError().body("cannot write session file")
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state: AppState = Data::new(RwLock::new(HashMap::new()));

    // Background task: every 30 minutes, remove sessions inactive for longer than the timeout
    let state_cleanup = state.clone();
    let inactivity_timeout = config.inactivity_timeout;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < inactivity_timeout);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive session(s)", removed);
            }
        }
    });

    let config = Data::new(config);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(config.clone())
            .service(api_health)
            .service(api_create_session)
            .service(api_get_session)
            .service(api_add_player)
            .service(api_import_players)
            .service(api_set_dropped)
            .service(api_rename_player)
            .service(api_standings)
            .service(api_check_round)
            .service(api_generate_round)
            .service(api_set_winner)
            .service(api_set_scores)
            .service(api_set_notes)
            .service(api_paste_winners)
            .service(api_commit_round)
            .service(api_delete_round)
            .service(api_bracket)
            .service(api_export)
            .service(api_import)
            .service(api_save)
    })
    .bind(bind)?
    .run()
    .await
}
