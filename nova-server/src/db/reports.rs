//! Dashboard and sales reports

use shared::error::AppError;
use shared::models::{DailySales, Dashboard, SalesSummary, TopProduct};
use shared::util::{start_of_day, start_of_month};
use sqlx::PgPool;

use super::now_millis;
use crate::error::ServiceResult;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
/// Default summary window when `from` is omitted
const DEFAULT_RANGE_DAYS: i64 = 30;
const TOP_PRODUCTS: i64 = 10;

pub async fn dashboard(pool: &PgPool, company_id: i64) -> ServiceResult<Dashboard> {
    let (product_count, service_count, low_stock_count, stock_value): (i64, i64, i64, i64) =
        sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE NOT is_service),
                COUNT(*) FILTER (WHERE is_service),
                COUNT(*) FILTER (WHERE NOT is_service AND stock_quantity <= min_stock),
                COALESCE(SUM(stock_quantity * cost_price) FILTER (WHERE NOT is_service), 0)::BIGINT
            FROM products
            WHERE company_id = $1 AND is_active
            "#,
        )
        .bind(company_id)
        .fetch_one(pool)
        .await?;

    let now = now_millis();
    let (sales_today_count, sales_today_total, sales_month_count, sales_month_total): (
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE created_at >= $2),
            COALESCE(SUM(total) FILTER (WHERE created_at >= $2), 0)::BIGINT,
            COUNT(*),
            COALESCE(SUM(total), 0)::BIGINT
        FROM sales
        WHERE company_id = $1 AND status = 'COMPLETED' AND created_at >= $3
        "#,
    )
    .bind(company_id)
    .bind(start_of_day(now))
    .bind(start_of_month(now))
    .fetch_one(pool)
    .await?;

    Ok(Dashboard {
        product_count,
        service_count,
        low_stock_count,
        stock_value,
        sales_today_count,
        sales_today_total,
        sales_month_count,
        sales_month_total,
    })
}

/// Resolve the `[from, to)` window, defaulting to the last 30 days
pub fn summary_range(from: Option<i64>, to: Option<i64>, now: i64) -> Result<(i64, i64), AppError> {
    let to = to.unwrap_or(now);
    let from = from.unwrap_or_else(|| start_of_day(to) - DEFAULT_RANGE_DAYS * DAY_MS);
    if from >= to {
        return Err(AppError::field("from", "must be before 'to'"));
    }
    Ok((from, to))
}

pub async fn summary(
    pool: &PgPool,
    company_id: i64,
    from: Option<i64>,
    to: Option<i64>,
) -> ServiceResult<SalesSummary> {
    let (from, to) = summary_range(from, to, now_millis())?;

    let (sale_count, total, cancelled_count): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE status = 'COMPLETED'),
            COALESCE(SUM(total) FILTER (WHERE status = 'COMPLETED'), 0)::BIGINT,
            COUNT(*) FILTER (WHERE status = 'CANCELLED')
        FROM sales
        WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
        "#,
    )
    .bind(company_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    let days = sqlx::query_as::<_, DailySales>(
        r#"
        SELECT created_at - MOD(created_at, $4) AS day,
               COUNT(*) AS sale_count,
               COALESCE(SUM(total), 0)::BIGINT AS total
        FROM sales
        WHERE company_id = $1 AND status = 'COMPLETED' AND created_at >= $2 AND created_at < $3
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(company_id)
    .bind(from)
    .bind(to)
    .bind(DAY_MS)
    .fetch_all(pool)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT i.product_id, i.product_name,
               SUM(i.quantity)::BIGINT AS quantity,
               SUM(i.total)::BIGINT AS total
        FROM sale_items i
        JOIN sales s ON s.id = i.sale_id
        WHERE s.company_id = $1 AND s.status = 'COMPLETED' AND s.created_at >= $2 AND s.created_at < $3
        GROUP BY i.product_id, i.product_name
        ORDER BY quantity DESC, total DESC
        LIMIT $4
        "#,
    )
    .bind(company_id)
    .bind(from)
    .bind(to)
    .bind(TOP_PRODUCTS)
    .fetch_all(pool)
    .await?;

    Ok(SalesSummary {
        from,
        to,
        sale_count,
        total,
        cancelled_count,
        days,
        top_products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_defaults_to_last_thirty_days() {
        let now = 1_760_000_000_000;
        let (from, to) = summary_range(None, None, now).unwrap();
        assert_eq!(to, now);
        assert_eq!(from, start_of_day(now) - 30 * DAY_MS);
    }

    #[test]
    fn summary_rejects_inverted_range() {
        assert!(summary_range(Some(10), Some(10), 0).is_err());
        assert_eq!(summary_range(Some(5), Some(10), 0).unwrap(), (5, 10));
    }
}
