use crate::{
    api::{attendance, notifications, progress, sections, team, todos},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(build_limiter(config.rate_register_per_min))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(build_limiter(config.rate_refresh_per_min))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(build_limiter(config.rate_protected_per_min)) // rate limiting
            .service(handlers::protected)
            .service(
                web::scope("/team")
                    // /team
                    .service(
                        web::resource("")
                            .route(web::post().to(team::create_member))
                            .route(web::get().to(team::list_members)),
                    )
                    // /team/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(team::get_member))
                            .route(web::put().to(team::update_member))
                            .route(web::delete().to(team::delete_member)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::put().to(attendance::mark_attendance))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    // /attendance/stats
                    .service(
                        web::resource("/stats").route(web::get().to(attendance::attendance_stats)),
                    )
                    // /attendance/sweep
                    .service(web::resource("/sweep").route(web::post().to(attendance::sweep))),
            )
            .service(
                web::scope("/progress")
                    // /progress/completion
                    .service(
                        web::resource("/completion")
                            .route(web::post().to(progress::record_completion)),
                    )
                    // /progress/adjustment
                    .service(
                        web::resource("/adjustment")
                            .route(web::post().to(progress::record_adjustment)),
                    )
                    // /progress/{project_id}/summary
                    .service(
                        web::resource("/{project_id}/summary")
                            .route(web::get().to(progress::project_summary)),
                    ),
            )
            .service(
                web::scope("/todos")
                    // /todos
                    .service(
                        web::resource("")
                            .route(web::post().to(todos::create_todo))
                            .route(web::get().to(todos::list_todos)),
                    )
                    // /todos/{id}/complete
                    .service(
                        web::resource("/{id}/complete")
                            .route(web::put().to(todos::complete_todo)),
                    )
                    // /todos/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(todos::update_todo))
                            .route(web::delete().to(todos::delete_todo)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    // /notifications/todo-assignment
                    .service(
                        web::resource("/todo-assignment")
                            .route(web::post().to(notifications::todo_assignment)),
                    ),
            )
            .service(
                web::scope("/sections")
                    // /sections
                    .service(web::resource("").route(web::get().to(sections::allowed_sections)))
                    // /sections/guard
                    .service(web::resource("/guard").route(web::get().to(sections::guard_path))),
            ),
    );
}
