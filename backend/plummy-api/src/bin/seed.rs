//! Seeds the default roles and a batch of sample users.
//! Run with: cargo run --bin seed
//! `SEED_USERS` sets how many users to create (default 100).

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use plummy_api::config::Config;
use plummy_api::db::Database;
use plummy_api::services::AuthService;

const ROLES: [&str; 6] = [
    "User",
    "Administrator",
    "Chief Executive Officer",
    "President",
    "Manager",
    "Software Engineer",
];

const FIRST_NAMES: [&str; 16] = [
    "Amelia", "Benjamin", "Camila", "Daniel", "Elena", "Felix", "Grace", "Hugo",
    "Isabel", "Julian", "Katarina", "Lucas", "Maya", "Nathan", "Olivia", "Patrick",
];

const LAST_NAMES: [&str; 16] = [
    "Anderson", "Bautista", "Castillo", "Dawson", "Espinoza", "Fischer", "Garrido", "Hernandez",
    "Ibarra", "Johansson", "Kowalski", "Lindqvist", "Moreno", "Navarro", "Okafor", "Petrov",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let user_count: usize = std::env::var("SEED_USERS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);

    println!("Connecting to database...");
    let db = Database::connect(&config).await?;
    db.run_migrations().await?;
    println!("Connected successfully!");

    println!("Seeding roles...");
    for (index, title) in ROLES.iter().enumerate() {
        sqlx::query("INSERT INTO roles (title, position) VALUES ($1, $2) ON CONFLICT (title) DO NOTHING")
            .bind(title)
            .bind(index as i32 + 1)
            .execute(&db.pg)
            .await?;
    }

    let role_ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM roles WHERE title = ANY($1)")
        .bind(ROLES.iter().map(|t| t.to_string()).collect::<Vec<_>>())
        .fetch_all(&db.pg)
        .await?;

    // Every seeded account shares the default password.
    let hashed_password = AuthService::hash_password(&config.accounts.default_password)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("Seeding {} users...", user_count);
    let mut rng = rand::thread_rng();
    let mut created = 0;
    for _ in 0..user_count {
        let first_name = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Alex");
        let last_name = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Smith");
        let tag: u32 = rng.gen_range(1000..1_000_000);
        let email = format!(
            "{}.{}.{}@plummy.dev",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            tag
        );
        let role_id = role_ids.choose(&mut rng).copied();
        let created_at = Utc::now() - Duration::days(rng.gen_range(1..730));

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, first_name, last_name, hashed_password, avatar_url, role_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(&email)
        .bind(first_name)
        .bind(last_name)
        .bind(&hashed_password)
        .bind(format!("https://i.pravatar.cc/150?u={}", email))
        .bind(role_id)
        .bind(created_at)
        .execute(&db.pg)
        .await?;
        created += result.rows_affected();
    }

    // Member order follows account age until someone reorders it.
    sqlx::query(
        r#"
        UPDATE roles r SET user_ids = ARRAY(
            SELECT u.id FROM users u WHERE u.role_id = r.id ORDER BY u.created_at
        )
        "#,
    )
    .execute(&db.pg)
    .await?;

    println!("\n========================================");
    println!("Seed complete");
    println!("========================================");
    println!("Roles:    {}", ROLES.len());
    println!("Users:    {}", created);
    println!("Password: {}", config.accounts.default_password);
    println!("========================================");

    Ok(())
}
