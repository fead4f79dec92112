use crate::database::MongoDB;
use crate::models::User;
use mongodb::bson::doc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum SeedOutcome {
    AlreadyPresent { id: String },
    Inserted { id: String },
}

/// Insert the default user unless one with `email` already exists.
pub async fn seed_default_user(db: &MongoDB, email: &str) -> mongodb::error::Result<SeedOutcome> {
    let users = db.collections().user;

    if let Some(existing) = users.find_one(doc! { "email": email }).await? {
        log::info!("👤 Default user {} already in DB, skipping seed", email);
        return Ok(SeedOutcome::AlreadyPresent { id: existing.id });
    }

    let user = build_default_user(email);
    users.insert_one(&user).await?;
    log::info!("   ✅ Inserted default user {} ({})", email, user.id);

    Ok(SeedOutcome::Inserted { id: user.id })
}

/// Fresh user document with a random id and secret.
pub fn build_default_user(email: &str) -> User {
    User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        secret: generate_secret(),
        picture: None,
    }
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
