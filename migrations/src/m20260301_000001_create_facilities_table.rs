use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260301_000001_create_facilities_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Facilities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Facilities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Facilities::Name).string_len(1000).not_null())
                    .col(ColumnDef::new(Facilities::DistrictId).big_integer().not_null())
                    .col(ColumnDef::new(Facilities::LocalBodyId).big_integer().null())
                    .col(ColumnDef::new(Facilities::StateId).big_integer().null())
                    .col(ColumnDef::new(Facilities::FacilityType).integer().not_null())
                    .col(ColumnDef::new(Facilities::Address).text().not_null())
                    .col(ColumnDef::new(Facilities::Latitude).double().null())
                    .col(ColumnDef::new(Facilities::Longitude).double().null())
                    .col(
                        ColumnDef::new(Facilities::OxygenCapacity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Facilities::PhoneNumber)
                            .string_len(14)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Facilities::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Facilities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Facilities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_facilities_district_id")
                    .table(Facilities::Table)
                    .col(Facilities::DistrictId)
                    .to_owned(),
            )
            .await?;

        // Expression indexes are not expressible through the index builder;
        // this statement is valid on both Postgres and SQLite.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_facilities_name_district \
                 ON facilities (lower(name), district_id)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Facilities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Facilities {
    Table,
    Id,
    Name,
    DistrictId,
    LocalBodyId,
    StateId,
    FacilityType,
    Address,
    Latitude,
    Longitude,
    OxygenCapacity,
    PhoneNumber,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
