use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_facilities_table::Facilities;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260301_000002_create_facility_capacities_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FacilityCapacities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FacilityCapacities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FacilityCapacities::FacilityId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FacilityCapacities::RoomType)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FacilityCapacities::TotalCapacity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FacilityCapacities::CurrentUsage)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FacilityCapacities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FacilityCapacities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_facility_capacities_facility_id")
                            .from(FacilityCapacities::Table, FacilityCapacities::FacilityId)
                            .to(Facilities::Table, Facilities::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_facility_capacities_facility_room_type")
                    .table(FacilityCapacities::Table)
                    .col(FacilityCapacities::FacilityId)
                    .col(FacilityCapacities::RoomType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FacilityCapacities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FacilityCapacities {
    Table,
    Id,
    FacilityId,
    RoomType,
    TotalCapacity,
    CurrentUsage,
    CreatedAt,
    UpdatedAt,
}
