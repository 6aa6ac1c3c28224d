use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use std::env;

use slotbook_backend::config::Config;
use slotbook_backend::domain::models::{team::Team, user::User};
use slotbook_backend::infra::factory::bootstrap_state;

/// Seeds a demo team with an admin account so a fresh database is usable.
/// Idempotent: re-running against an existing slug is a no-op.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let config = Config::from_env();
    let state = bootstrap_state(&config).await;

    let team_name = env::var("SEED_TEAM_NAME").unwrap_or_else(|_| "Demo Clinic".to_string());
    let team_slug = env::var("SEED_TEAM_SLUG").unwrap_or_else(|_| "demo-clinic".to_string());
    let admin_email = env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_password = env::var("SEED_ADMIN_PASSWORD").expect("SEED_ADMIN_PASSWORD must be set");

    if let Some(existing) = state
        .team_repo
        .find_by_slug(&team_slug)
        .await
        .expect("Failed to query teams")
    {
        println!("Team '{}' already exists ({}), nothing to do", team_slug, existing.id);
        return;
    }

    let team = state
        .team_repo
        .create(&Team::new(team_name, team_slug.clone()))
        .await
        .expect("Failed to create team");

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(admin_password.as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string();

    let admin = state
        .user_repo
        .create(&User::new(
            team.id.clone(),
            admin_email.to_lowercase(),
            password_hash,
            "ADMIN".to_string(),
        ))
        .await
        .expect("Failed to create admin user");

    println!("Seeded team '{}' ({}) with admin {}", team_slug, team.id, admin.email);
}
