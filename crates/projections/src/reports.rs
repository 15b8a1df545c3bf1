//! Report computation over the record store.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use common::{CustomerId, Money, ProductId};
use record_store::{OrderFilter, OrderStatus, ProductFilter, RecordStore};
use serde::Serialize;

use crate::Result;
use crate::error::ReportError;

/// No cap: reports scan every matching row.
const ALL: usize = usize::MAX;

/// A product ranked by units sold across COMPLETED orders.
#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub price: Money,
    pub total_quantity_sold: u64,
    /// Units sold valued at the product's current price.
    pub total_revenue: Money,
}

/// Revenue over one calendar month.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub total_revenue: Money,
    pub period_start: DateTime<Utc>,
    /// Exclusive upper bound of the period.
    pub period_end: DateTime<Utc>,
    pub order_count: usize,
}

/// Per-customer order statistics across all order statuses.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerOrdersSummary {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: Option<String>,
    pub total_orders: usize,
    pub total_spent: Money,
}

/// A customer with more than the requested number of orders.
#[derive(Debug, Clone, Serialize)]
pub struct RepeatCustomer {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: Option<String>,
    pub total_orders: usize,
    pub total_spent: Money,
    pub last_order_date: Option<DateTime<Utc>>,
}

/// Overall sales metrics.
#[derive(Debug, Clone, Serialize)]
pub struct SalesSummary {
    /// Revenue from COMPLETED orders only.
    pub total_revenue: Money,
    pub total_orders: usize,
    pub completed_orders: usize,
    /// Orders not yet completed (includes cancelled ones).
    pub pending_orders: usize,
    pub total_customers: usize,
    pub average_order_value: Money,
    /// Completed orders as a percentage of all orders.
    pub completion_rate: f64,
}

/// Every report in one bundle, for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct AllReports {
    pub sales_summary: SalesSummary,
    pub top_selling_products: Vec<TopProduct>,
    pub revenue_last_month: RevenueReport,
    pub orders_per_customer: Vec<CustomerOrdersSummary>,
    pub repeat_customers: Vec<RepeatCustomer>,
}

/// Read-side report service.
#[derive(Clone)]
pub struct Reports<S> {
    store: S,
}

impl<S: RecordStore> Reports<S> {
    /// Creates a report service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Top products by units sold across COMPLETED orders. Products
    /// with no sales rank last with a zero count.
    #[tracing::instrument(skip(self))]
    pub async fn top_selling_products(&self, limit: usize) -> Result<Vec<TopProduct>> {
        if limit == 0 {
            return Err(ReportError::InvalidLimit);
        }

        let completed = self
            .store
            .list_orders(OrderFilter::with_status(OrderStatus::Completed), ALL)
            .await?;

        let mut sold: HashMap<ProductId, u64> = HashMap::new();
        for order in &completed {
            for item in self.store.list_order_items(order.id).await? {
                *sold.entry(item.product_id).or_default() += u64::from(item.quantity);
            }
        }

        let products = self
            .store
            .list_products(ProductFilter::default(), ALL)
            .await?;

        let mut ranked: Vec<TopProduct> = products
            .into_iter()
            .map(|p| {
                let quantity = sold.get(&p.id).copied().unwrap_or(0);
                TopProduct {
                    total_revenue: Money::from_cents(p.price.cents() * quantity as i64),
                    product_id: p.id,
                    name: p.name,
                    sku: p.sku,
                    category: p.category,
                    price: p.price,
                    total_quantity_sold: quantity,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.total_quantity_sold.cmp(&a.total_quantity_sold));
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Revenue from COMPLETED orders created in the calendar month
    /// before the one containing `now`.
    #[tracing::instrument(skip(self))]
    pub async fn revenue_last_month(&self, now: DateTime<Utc>) -> Result<RevenueReport> {
        let first_of_this_month = first_of_month(now.year(), now.month());
        let (prev_year, prev_month) = if now.month() == 1 {
            (now.year() - 1, 12)
        } else {
            (now.year(), now.month() - 1)
        };
        let period_start = first_of_month(prev_year, prev_month);

        let completed = self
            .store
            .list_orders(OrderFilter::with_status(OrderStatus::Completed), ALL)
            .await?;

        let in_period: Vec<_> = completed
            .iter()
            .filter(|o| o.created_at >= period_start && o.created_at < first_of_this_month)
            .collect();

        Ok(RevenueReport {
            total_revenue: in_period.iter().map(|o| o.total_amount).sum(),
            period_start,
            period_end: first_of_this_month,
            order_count: in_period.len(),
        })
    }

    /// Order count and spend per customer, across every order status,
    /// most active customers first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_per_customer(&self) -> Result<Vec<CustomerOrdersSummary>> {
        let customers = self.store.list_customers(ALL).await?;
        let orders = self.store.list_orders(OrderFilter::default(), ALL).await?;

        let mut counts: HashMap<CustomerId, (usize, Money)> = HashMap::new();
        for order in &orders {
            let entry = counts
                .entry(order.customer_id)
                .or_insert((0, Money::zero()));
            entry.0 += 1;
            entry.1 += order.total_amount;
        }

        let mut summaries: Vec<CustomerOrdersSummary> = customers
            .into_iter()
            .map(|c| {
                let (total_orders, total_spent) =
                    counts.get(&c.id).copied().unwrap_or((0, Money::zero()));
                CustomerOrdersSummary {
                    customer_id: c.id,
                    name: c.name,
                    email: c.email,
                    phone: c.phone,
                    city: c.city,
                    total_orders,
                    total_spent,
                }
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.total_orders
                .cmp(&a.total_orders)
                .then(b.total_spent.cmp(&a.total_spent))
        });
        Ok(summaries)
    }

    /// Customers with more than `min_orders` orders, with their last
    /// order date.
    #[tracing::instrument(skip(self))]
    pub async fn repeat_customers(&self, min_orders: usize) -> Result<Vec<RepeatCustomer>> {
        if min_orders < 1 {
            return Err(ReportError::InvalidMinOrders);
        }

        let customers = self.store.list_customers(ALL).await?;
        let orders = self.store.list_orders(OrderFilter::default(), ALL).await?;

        let mut stats: HashMap<CustomerId, (usize, Money, Option<DateTime<Utc>>)> = HashMap::new();
        for order in &orders {
            let entry = stats
                .entry(order.customer_id)
                .or_insert((0, Money::zero(), None));
            entry.0 += 1;
            entry.1 += order.total_amount;
            entry.2 = Some(entry.2.map_or(order.created_at, |d| d.max(order.created_at)));
        }

        let mut repeat: Vec<RepeatCustomer> = customers
            .into_iter()
            .filter_map(|c| {
                let (total_orders, total_spent, last_order_date) =
                    stats.get(&c.id).copied().unwrap_or((0, Money::zero(), None));
                (total_orders > min_orders).then_some(RepeatCustomer {
                    customer_id: c.id,
                    name: c.name,
                    email: c.email,
                    phone: c.phone,
                    city: c.city,
                    total_orders,
                    total_spent,
                    last_order_date,
                })
            })
            .collect();

        repeat.sort_by(|a, b| {
            b.total_orders
                .cmp(&a.total_orders)
                .then(b.total_spent.cmp(&a.total_spent))
        });
        Ok(repeat)
    }

    /// Overall sales metrics. Revenue and averages come from COMPLETED
    /// orders; orders without a payment record are counted like any
    /// other.
    #[tracing::instrument(skip(self))]
    pub async fn sales_summary(&self) -> Result<SalesSummary> {
        let orders = self.store.list_orders(OrderFilter::default(), ALL).await?;
        let customers = self.store.list_customers(ALL).await?;

        let completed: Vec<_> = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .collect();
        let total_revenue: Money = completed.iter().map(|o| o.total_amount).sum();

        let average_order_value = if completed.is_empty() {
            Money::zero()
        } else {
            Money::from_cents(total_revenue.cents() / completed.len() as i64)
        };
        let completion_rate = if orders.is_empty() {
            0.0
        } else {
            completed.len() as f64 / orders.len() as f64 * 100.0
        };

        Ok(SalesSummary {
            total_revenue,
            total_orders: orders.len(),
            completed_orders: completed.len(),
            pending_orders: orders.len() - completed.len(),
            total_customers: customers.len(),
            average_order_value,
            completion_rate,
        })
    }

    /// All reports in one call, for dashboards.
    #[tracing::instrument(skip(self))]
    pub async fn all_reports(&self, now: DateTime<Utc>) -> Result<AllReports> {
        Ok(AllReports {
            sales_summary: self.sales_summary().await?,
            top_selling_products: self.top_selling_products(5).await?,
            revenue_last_month: self.revenue_last_month(now).await?,
            orders_per_customer: self.orders_per_customer().await?,
            repeat_customers: self.repeat_customers(2).await?,
        })
    }
}

fn first_of_month(year: i32, month: u32) -> DateTime<Utc> {
    // Both inputs come from a valid date, so the constructed date is
    // always valid too.
    NaiveDate::from_ymd_opt(year, month, 1)
        .expect("valid month start")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
        .and_utc()
}
