use sqlx::types::time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Organization {
    pub id: i64,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Interview {
    pub id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    /// Organization scope the pin is unique within
    pub phone_number_id: i64,
    pub pin: String,
    pub applicant_id: String,
}
