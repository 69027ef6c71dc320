#![allow(elided_lifetimes_in_paths)] // async-trait keeps SchemaManager lifetime late-bound; rust_2018_idioms deny conflicts
use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_products_table::Migration),
            Box::new(m20250301_000002_create_sales_tables::Migration),
            Box::new(m20250301_000003_create_orders_tables::Migration),
            Box::new(m20250301_000004_create_financial_movements_table::Migration),
            Box::new(m20250301_000005_create_transfer_confirmations_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250301_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::StockQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::MinStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        Sku,
        Price,
        StockQuantity,
        MinStock,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_sales_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Sales::SaleNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Sales::EmployeeId).uuid().not_null())
                        .col(
                            ColumnDef::new(Sales::SoldAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Sales::Subtotal).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Sales::DiscountAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sales::TaxAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sales::TotalAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Sales::PaymentMethod).string().not_null())
                        .col(ColumnDef::new(Sales::Status).string().not_null())
                        .col(ColumnDef::new(Sales::CashReceived).decimal_len(12, 2))
                        .col(ColumnDef::new(Sales::ChangeGiven).decimal_len(12, 2))
                        .col(ColumnDef::new(Sales::TransferVoucher).text())
                        .col(ColumnDef::new(Sales::BankReference).string())
                        .col(ColumnDef::new(Sales::TransferAmount).decimal_len(12, 2))
                        .col(
                            ColumnDef::new(Sales::TransferConfirmed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Sales::TransferConfirmedBy).uuid())
                        .col(ColumnDef::new(Sales::TransferConfirmedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Sales::CustomerName).string())
                        .col(ColumnDef::new(Sales::CustomerPhone).string())
                        .col(ColumnDef::new(Sales::CustomerEmail).string())
                        .col(ColumnDef::new(Sales::Notes).text())
                        .col(
                            ColumnDef::new(Sales::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Sales::UpdatedAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Sales::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SaleItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SaleItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::ProductName).string().not_null())
                        .col(ColumnDef::new(SaleItems::ProductSku).string().not_null())
                        .col(
                            ColumnDef::new(SaleItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SaleItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(SaleItems::DiscountPercent)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SaleItems::LineTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SaleItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sale_items_sale")
                                .from(SaleItems::Table, SaleItems::SaleId)
                                .to(Sales::Table, Sales::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sale_items_sale_id")
                        .table(SaleItems::Table)
                        .col(SaleItems::SaleId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Sales {
        Table,
        Id,
        SaleNumber,
        EmployeeId,
        SoldAt,
        Subtotal,
        DiscountAmount,
        TaxAmount,
        TotalAmount,
        PaymentMethod,
        Status,
        CashReceived,
        ChangeGiven,
        TransferVoucher,
        BankReference,
        TransferAmount,
        TransferConfirmed,
        TransferConfirmedBy,
        TransferConfirmedAt,
        CustomerName,
        CustomerPhone,
        CustomerEmail,
        Notes,
        CreatedAt,
        UpdatedAt,
        Version,
    }

    #[derive(DeriveIden)]
    enum SaleItems {
        Table,
        Id,
        SaleId,
        ProductId,
        ProductName,
        ProductSku,
        UnitPrice,
        Quantity,
        DiscountPercent,
        LineTotal,
        CreatedAt,
    }
}

mod m20250301_000003_create_orders_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_orders_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).uuid())
                        .col(ColumnDef::new(Orders::DeliveryType).string().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(ColumnDef::new(Orders::Subtotal).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Orders::DiscountAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TaxAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::PaymentMethod).string().not_null())
                        .col(ColumnDef::new(Orders::PaymentStatus).string().not_null())
                        .col(ColumnDef::new(Orders::TransferVoucher).text())
                        .col(ColumnDef::new(Orders::BankReference).string())
                        .col(ColumnDef::new(Orders::TransferAmount).decimal_len(12, 2))
                        .col(
                            ColumnDef::new(Orders::TransferConfirmed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Orders::TransferConfirmedBy).uuid())
                        .col(ColumnDef::new(Orders::TransferConfirmedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Orders::ShippingAddress).json())
                        .col(ColumnDef::new(Orders::TrackingNumber).string())
                        .col(ColumnDef::new(Orders::EstimatedDeliveryDate).date())
                        .col(ColumnDef::new(Orders::PickupDate).date())
                        .col(ColumnDef::new(Orders::PickupTimeSlot).string())
                        .col(ColumnDef::new(Orders::EstimatedPickupDate).date())
                        .col(
                            ColumnDef::new(Orders::RequiresConfirmation)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Orders::ConfirmedBy).uuid())
                        .col(ColumnDef::new(Orders::ConfirmedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Orders::ProcessedBy).uuid())
                        .col(ColumnDef::new(Orders::ProcessedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Orders::DeliveryDate).timestamp_with_time_zone())
                        .col(ColumnDef::new(Orders::Notes).text())
                        .col(
                            ColumnDef::new(Orders::PlacedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Orders::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductName).string().not_null())
                        .col(ColumnDef::new(OrderItems::ProductSku).string().not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::DiscountPercent)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderItems::LineTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        DeliveryType,
        Status,
        Subtotal,
        DiscountAmount,
        TaxAmount,
        TotalAmount,
        PaymentMethod,
        PaymentStatus,
        TransferVoucher,
        BankReference,
        TransferAmount,
        TransferConfirmed,
        TransferConfirmedBy,
        TransferConfirmedAt,
        ShippingAddress,
        TrackingNumber,
        EstimatedDeliveryDate,
        PickupDate,
        PickupTimeSlot,
        EstimatedPickupDate,
        RequiresConfirmation,
        ConfirmedBy,
        ConfirmedAt,
        ProcessedBy,
        ProcessedAt,
        DeliveryDate,
        Notes,
        PlacedAt,
        CreatedAt,
        UpdatedAt,
        Version,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        ProductName,
        ProductSku,
        UnitPrice,
        Quantity,
        DiscountPercent,
        LineTotal,
        CreatedAt,
    }
}

mod m20250301_000004_create_financial_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_financial_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FinancialMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FinancialMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::Category)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::Description)
                                .text()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::Amount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::PaymentMethod)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::ReferenceId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::ReferenceType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::RegisteredBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinancialMovements::UpdatedAt)
                                .timestamp_with_time_zone(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_financial_movements_reference")
                        .table(FinancialMovements::Table)
                        .col(FinancialMovements::ReferenceType)
                        .col(FinancialMovements::ReferenceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FinancialMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum FinancialMovements {
        Table,
        Id,
        MovementType,
        Category,
        Description,
        Amount,
        PaymentMethod,
        ReferenceId,
        ReferenceType,
        RegisteredBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000005_create_transfer_confirmations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000005_create_transfer_confirmations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TransferConfirmations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TransferConfirmations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransferConfirmations::ReferenceId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransferConfirmations::ReferenceType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransferConfirmations::Voucher)
                                .text()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransferConfirmations::BankReference).string())
                        .col(
                            ColumnDef::new(TransferConfirmations::Amount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransferConfirmations::ConfirmedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransferConfirmations::ConfirmedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransferConfirmations::Notes).text())
                        .col(
                            ColumnDef::new(TransferConfirmations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_transfer_confirmations_reference")
                        .table(TransferConfirmations::Table)
                        .col(TransferConfirmations::ReferenceType)
                        .col(TransferConfirmations::ReferenceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TransferConfirmations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TransferConfirmations {
        Table,
        Id,
        ReferenceId,
        ReferenceType,
        Voucher,
        BankReference,
        Amount,
        ConfirmedBy,
        ConfirmedAt,
        Notes,
        CreatedAt,
    }
}
