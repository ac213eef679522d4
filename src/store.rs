use crate::config::Config;
use crate::db_types::{Interview, Organization};
use crate::types::ApplicantId;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::{debug, info};

/// Data access used by the pin handler.
#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Interview belonging to `applicant_id`, if any.
    async fn get_interview(&self, applicant_id: &ApplicantId)
        -> Result<Option<Interview>, sqlx::Error>;

    async fn get_organization(&self, organization_id: i64)
        -> Result<Option<Organization>, sqlx::Error>;

    /// Every pin currently assigned within an organization's scope.
    async fn scope_pins(&self, organization_id: i64) -> Result<Vec<String>, sqlx::Error>;

    /// Insert a new interview stamped with the current time and return the stored row.
    async fn insert_interview(
        &self,
        organization_id: i64,
        applicant_id: &ApplicantId,
        pin: &str,
    ) -> Result<Interview, sqlx::Error>;

    /// Release held resources.  Called once at shutdown.
    async fn close(&self);
}

pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        let mut options = PgPoolOptions::new().max_connections(config.max_connections);
        if let Some(timeout) = config.store_timeout {
            options = options.acquire_timeout(timeout);
        }
        let pool = options.connect(&config.database_url).await?;
        info!(max_connections = config.max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await?;
        info!("migrations applied");
        Ok(())
    }
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn get_interview(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Option<Interview>, sqlx::Error> {
        sqlx::query_as::<_, Interview>(
            "
            select
              id::int8 as id,
              created_at,
              updated_at,
              phone_number_id::int8 as phone_number_id,
              pin,
              applicant_id::text as applicant_id
            from interviews
            where applicant_id::text = $1
            ",
        )
        .bind(applicant_id.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_organization(
        &self,
        organization_id: i64,
    ) -> Result<Option<Organization>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            "
            select id::int8 as id
            from organizations
            where id = $1
            ",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn scope_pins(&self, organization_id: i64) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "
            select pin
            from interviews
            where phone_number_id = $1
            ",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_interview(
        &self,
        organization_id: i64,
        applicant_id: &ApplicantId,
        pin: &str,
    ) -> Result<Interview, sqlx::Error> {
        sqlx::query_as::<_, Interview>(
            "
            insert into interviews (
              created_at,
              updated_at,
              phone_number_id,
              pin,
              applicant_id
            ) values (
              now(),
              now(),
              $1,
              $2,
              $3
            )
            returning
              id::int8 as id,
              created_at,
              updated_at,
              phone_number_id::int8 as phone_number_id,
              pin,
              applicant_id::text as applicant_id
            ",
        )
        .bind(organization_id)
        .bind(pin)
        .bind(applicant_id.as_str())
        .fetch_one(&self.pool)
        .await
    }

    async fn close(&self) {
        debug!("closing postgres pool");
        self.pool.close().await;
    }
}


#[cfg(test)]
mod pg_tests {
    use super::{InterviewStore, PgStore};
    use crate::config::Config;
    use crate::types::ApplicantId;

    #[tokio::test]
    #[ignore = "needs a postgres instance at DATABASE_URL"]
    async fn postgres_round_trip() {
        dotenvy::dotenv().ok();
        let config = Config::from_env().unwrap();
        let store = PgStore::connect(&config).await.unwrap();
        store.migrate().await.unwrap();

        let organization_id: i64 = sqlx::query_scalar(
            "insert into organizations (name) values ('pin round trip') returning id::int8",
        )
        .fetch_one(&store.pool)
        .await
        .unwrap();
        let applicant_id = ApplicantId(format!("round-trip-{organization_id}"));

        assert!(store.get_interview(&applicant_id).await.unwrap().is_none());
        let organization = store.get_organization(organization_id).await.unwrap();
        assert_eq!(organization.map(|o| o.id), Some(organization_id));
        assert!(store.scope_pins(organization_id).await.unwrap().is_empty());

        let created = store
            .insert_interview(organization_id, &applicant_id, "0042")
            .await
            .unwrap();
        assert_eq!(created.phone_number_id, organization_id);
        assert_eq!(created.pin, "0042");
        assert_eq!(created.applicant_id, applicant_id.as_str());
        assert_eq!(created.created_at, created.updated_at);

        let found = store.get_interview(&applicant_id).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.pin, "0042");
        assert_eq!(
            store.scope_pins(organization_id).await.unwrap(),
            vec!["0042".to_string()]
        );

        sqlx::query("delete from interviews where phone_number_id = $1")
            .bind(organization_id)
            .execute(&store.pool)
            .await
            .unwrap();
        sqlx::query("delete from organizations where id = $1")
            .bind(organization_id)
            .execute(&store.pool)
            .await
            .unwrap();
        store.close().await;
    }
}
