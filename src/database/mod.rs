pub mod indexes;

use crate::config::Config;
use crate::models::{Card, Deck, Media, User};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};

const APP_NAME: &str = "rep2recall-migrate";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

/// Typed handles for the collections other tools work with.
#[derive(Clone, Debug)]
pub struct Collections {
    pub user: Collection<User>,
    pub deck: Collection<Deck>,
    pub card: Collection<Card>,
    pub media: Collection<Media>,
}

impl MongoDB {
    /// Build a client for `config`. No round-trip happens here; the driver
    /// connects on the first operation.
    pub async fn connect(config: &Config) -> mongodb::error::Result<Self> {
        let mut client_options = ClientOptions::parse(config.mongo_uri.as_str()).await?;
        client_options.app_name = Some(APP_NAME.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database_name);

        log::info!(
            "🔌 MongoDB client ready: {} (database: {})",
            config.redacted_uri(),
            config.database_name
        );

        Ok(Self { db })
    }

    pub fn collections(&self) -> Collections {
        Collections {
            user: self.collection(User::COLLECTION),
            deck: self.collection(Deck::COLLECTION),
            card: self.collection(Card::COLLECTION),
            media: self.collection(Media::COLLECTION),
        }
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Ping the server
    pub async fn health_check(&self) -> mongodb::error::Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
