use gatehouse_application::{IpBanService, UserService};

use crate::client_ip::ClientIpResolver;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub ip_ban_service: IpBanService,
    pub client_ip_resolver: ClientIpResolver,
    pub frontend_url: String,
}
