//! Row export for company backups
//!
//! Each exported table is described by its columns and a FROM clause bound
//! to the company id. Values are cast to text in SQL and fetched as a
//! `TEXT[]` per row, so one code path serves every table.

use sqlx::PgPool;

use crate::backup::{CsvFile, CsvWriter};
use crate::error::ServiceResult;

struct TableExport {
    file: &'static str,
    columns: &'static [&'static str],
    /// FROM/WHERE clause; the exported table is aliased `x`, `$1` is the company id
    source: &'static str,
}

const CORE_TABLES: &[TableExport] = &[
    TableExport {
        file: "company.csv",
        columns: &["id", "name", "tax_id", "email", "phone", "address", "currency", "logo_url", "created_at", "updated_at"],
        source: "companies x WHERE x.id = $1",
    },
    TableExport {
        file: "members.csv",
        columns: &["user_id", "role", "joined_at"],
        source: "company_users x WHERE x.company_id = $1",
    },
    TableExport {
        file: "categories.csv",
        columns: &["id", "name", "description", "is_service", "created_at", "updated_at"],
        source: "categories x WHERE x.company_id = $1",
    },
    TableExport {
        file: "units.csv",
        columns: &["id", "name", "abbreviation", "created_at"],
        source: "product_units x WHERE x.company_id = $1",
    },
    TableExport {
        file: "products.csv",
        columns: &[
            "id", "category_id", "unit_id", "name", "description", "sku", "barcode", "is_service",
            "cost_price", "sale_price", "stock_quantity", "min_stock", "is_active", "image_url",
            "created_at", "updated_at",
        ],
        source: "products x WHERE x.company_id = $1",
    },
    TableExport {
        file: "movements.csv",
        columns: &[
            "id", "product_id", "movement_type", "quantity", "previous_quantity", "new_quantity",
            "unit_cost", "reason", "sale_id", "user_id", "created_at",
        ],
        source: "stock_movements x WHERE x.company_id = $1",
    },
    TableExport {
        file: "sales.csv",
        columns: &[
            "id", "user_id", "order_id", "status", "payment_method", "customer_name", "notes",
            "subtotal", "discount", "total", "cancelled_at", "cancel_reason", "created_at",
        ],
        source: "sales x WHERE x.company_id = $1",
    },
    TableExport {
        file: "sale_items.csv",
        columns: &["id", "sale_id", "product_id", "product_name", "is_service", "quantity", "unit_price", "total"],
        source: "sale_items x JOIN sales s ON s.id = x.sale_id WHERE s.company_id = $1",
    },
];

const RESTAURANT_TABLES: &[TableExport] = &[
    TableExport {
        file: "restaurant_tables.csv",
        columns: &["id", "number", "name", "capacity", "status", "created_at", "updated_at"],
        source: "restaurant_tables x WHERE x.company_id = $1",
    },
    TableExport {
        file: "menu_items.csv",
        columns: &[
            "id", "name", "description", "price", "category", "is_available", "product_id",
            "preparation_minutes", "created_at", "updated_at",
        ],
        source: "menu_items x WHERE x.company_id = $1",
    },
    TableExport {
        file: "waiters.csv",
        columns: &["id", "name", "phone", "is_active", "created_at", "updated_at"],
        source: "waiters x WHERE x.company_id = $1",
    },
    TableExport {
        file: "orders.csv",
        columns: &[
            "id", "table_id", "waiter_id", "status", "notes", "total", "sale_id", "created_at",
            "updated_at", "closed_at",
        ],
        source: "orders x WHERE x.company_id = $1",
    },
    TableExport {
        file: "order_items.csv",
        columns: &[
            "id", "order_id", "menu_item_id", "name", "quantity", "unit_price", "notes", "status",
            "created_at", "updated_at",
        ],
        source: "order_items x JOIN orders o ON o.id = x.order_id WHERE o.company_id = $1",
    },
    TableExport {
        file: "reservations.csv",
        columns: &[
            "id", "table_id", "customer_name", "customer_phone", "party_size", "reserved_for",
            "notes", "status", "created_at", "updated_at",
        ],
        source: "reservations x WHERE x.company_id = $1",
    },
];

fn select_sql(table: &TableExport) -> String {
    let fields = table
        .columns
        .iter()
        .map(|c| format!("x.{c}::text"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT ARRAY[{fields}] FROM {} ORDER BY x.{}",
        table.source, table.columns[0]
    )
}

async fn export_table(pool: &PgPool, company_id: i64, table: &TableExport) -> ServiceResult<CsvFile> {
    let rows: Vec<(Vec<Option<String>>,)> = sqlx::query_as(&select_sql(table))
        .bind(company_id)
        .fetch_all(pool)
        .await?;

    let mut writer = CsvWriter::with_header(table.columns);
    for (values,) in &rows {
        writer.write_record(values.iter().map(|v| v.as_deref()));
    }
    Ok(CsvFile {
        name: table.file.to_string(),
        content: writer.into_bytes(),
    })
}

/// Render every company table as CSV
pub async fn export_company(
    pool: &PgPool,
    company_id: i64,
    include_restaurant: bool,
) -> ServiceResult<Vec<CsvFile>> {
    let restaurant: &[TableExport] = if include_restaurant { RESTAURANT_TABLES } else { &[] };
    let mut files = Vec::with_capacity(CORE_TABLES.len() + restaurant.len());
    for table in CORE_TABLES.iter().chain(restaurant) {
        files.push(export_table(pool, company_id, table).await?);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_casts_every_column_to_text() {
        let sql = select_sql(&CORE_TABLES[3]);
        assert_eq!(
            sql,
            "SELECT ARRAY[x.id::text, x.name::text, x.abbreviation::text, x.created_at::text] \
             FROM product_units x WHERE x.company_id = $1 ORDER BY x.id"
        );
    }

    #[test]
    fn required_files_are_exported() {
        let names: Vec<&str> = CORE_TABLES.iter().map(|t| t.file).collect();
        for required in [
            "company.csv",
            "categories.csv",
            "units.csv",
            "products.csv",
            "movements.csv",
            "sales.csv",
            "sale_items.csv",
        ] {
            assert!(names.contains(&required), "{required} missing");
        }
    }
}
