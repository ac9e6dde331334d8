pub mod health;
pub mod ip_bans;
