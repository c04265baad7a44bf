use actix_web::web::ServiceConfig;

mod health;

pub fn routes(cfg: &mut ServiceConfig) {
    cfg.service(health::health_route);
}
