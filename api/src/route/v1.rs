use axum::Router;
use registry::AppRegistry;

use super::{
    auth::build_auth_routers, booking::build_booking_routers,
    health::build_health_check_routers, room::build_room_routers,
};

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_health_check_routers())
        .merge(build_auth_routers())
        .merge(build_room_routers())
        .merge(build_booking_routers());
    Router::new().nest("/api/v1", router)
}
