use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{auth, health, playlist, problem, submission};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health::healthcheck))
        .nest("/auth", auth_routes())
        .nest("/problems", problem_routes())
        .nest("/submissions", submission_routes())
        .nest("/playlists", playlist_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::refresh))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::change_password))
        .routes(routes!(auth::me))
}

fn problem_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(problem::list_problems, problem::create_problem))
        .routes(routes!(problem::list_solved_problems))
        .routes(routes!(
            problem::get_problem,
            problem::update_problem,
            problem::delete_problem
        ))
        .routes(routes!(submission::execute_code))
        .routes(routes!(submission::list_problem_submissions))
        .routes(routes!(submission::count_problem_submissions))
}

fn submission_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(submission::list_submissions))
        .routes(routes!(submission::get_submission))
}

fn playlist_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(playlist::list_playlists, playlist::create_playlist))
        .routes(routes!(
            playlist::get_playlist,
            playlist::delete_playlist
        ))
        .routes(routes!(playlist::add_problems, playlist::remove_problems))
}
