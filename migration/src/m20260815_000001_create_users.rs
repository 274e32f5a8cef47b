use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::WalletAddress)
                            .string_len(44)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::ProfilePictureUrl)
                            .string_len(512)
                            .null(),
                    )
                    .col(ColumnDef::new(Users::FirstName).string_len(64).null())
                    .col(ColumnDef::new(Users::LastName).string_len(64).null())
                    .col(ColumnDef::new(Users::CardNumber).string_len(16).null())
                    .col(ColumnDef::new(Users::ExpiryDate).string_len(5).null())
                    .col(ColumnDef::new(Users::SecurityCode).string_len(3).null())
                    .col(
                        ColumnDef::new(Users::Balance)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::OrderDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on wallet_address for the profile lookup path
        manager
            .create_index(
                Index::create()
                    .name("idx_users_wallet_address")
                    .table(Users::Table)
                    .col(Users::WalletAddress)
                    .to_owned(),
            )
            .await?;

        // Case-insensitive username availability checks go through LOWER(username)
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_users_username_lower ON users (LOWER(username));",
        )
        .await?;

        // Create trigger function for updated_at (if not exists)
        db.execute_unprepared(
            r#"
            CREATE OR REPLACE FUNCTION update_users_updated_at()
            RETURNS TRIGGER AS $$
            BEGIN
                NEW.updated_at = NOW();
                RETURN NEW;
            END;
            $$ LANGUAGE plpgsql;
            "#,
        )
        .await?;

        // Create trigger on users table
        db.execute_unprepared(
            r#"
            DROP TRIGGER IF EXISTS trigger_users_updated_at ON users;
            CREATE TRIGGER trigger_users_updated_at
                BEFORE UPDATE ON users
                FOR EACH ROW
                EXECUTE FUNCTION update_users_updated_at();
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TRIGGER IF EXISTS trigger_users_updated_at ON users;")
            .await?;
        db.execute_unprepared("DROP FUNCTION IF EXISTS update_users_updated_at();")
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    WalletAddress,
    Username,
    Email,
    ProfilePictureUrl,
    FirstName,
    LastName,
    CardNumber,
    ExpiryDate,
    SecurityCode,
    Balance,
    OrderDate,
    CreatedAt,
    UpdatedAt,
}
