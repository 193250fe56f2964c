//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible
//! defaults. These builders allow tests to specify only the relevant fields
//! while using defaults for everything else.

use core_kernel::{AccountId, Currency, EstablishmentId, Money, OrderId, ProductId};
use domain_credit::CreditLimit;
use domain_invoicing::{tax_class, CreateInvoice, Establishment, LineRequest};
use domain_payments::{OrderStatus, OrderSummary};
use fake::faker::company::en::CompanyName;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{IdFixtures, MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for document line requests
pub struct LineRequestBuilder {
    product_id: ProductId,
    product_name: String,
    description: Option<String>,
    quantity: u32,
    unit_price: Decimal,
    tax_class: String,
}

impl Default for LineRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineRequestBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            product_id: IdFixtures::product_id(),
            product_name: StringFixtures::product_name().to_string(),
            description: None,
            quantity: 1,
            unit_price: dec!(100.00),
            tax_class: tax_class::STANDARD.to_string(),
        }
    }

    /// Sets the product ID
    pub fn with_product_id(mut self, id: ProductId) -> Self {
        self.product_id = id;
        self
    }

    /// Sets the product name
    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = name.into();
        self
    }

    /// Sets the line description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the unit price
    pub fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = unit_price;
        self
    }

    /// Sets the tax class
    pub fn with_tax_class(mut self, tax_class: impl Into<String>) -> Self {
        self.tax_class = tax_class.into();
        self
    }

    /// Builds the line request
    pub fn build(self) -> LineRequest {
        LineRequest {
            product_id: self.product_id,
            product_name: self.product_name,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            tax_class: self.tax_class,
        }
    }
}

/// Builder for invoice creation commands
pub struct CreateInvoiceBuilder {
    establishment_id: EstablishmentId,
    order_id: Option<OrderId>,
    customer_id: AccountId,
    vendor_id: AccountId,
    currency: Currency,
    po_number: Option<String>,
    notes: Option<String>,
    lines: Vec<LineRequest>,
}

impl Default for CreateInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateInvoiceBuilder {
    /// Creates a new builder with a single standard line
    pub fn new() -> Self {
        Self {
            establishment_id: IdFixtures::establishment_id(),
            order_id: Some(IdFixtures::order_id()),
            customer_id: IdFixtures::buyer_id(),
            vendor_id: IdFixtures::vendor_id(),
            currency: Currency::EUR,
            po_number: Some(StringFixtures::po_number().to_string()),
            notes: None,
            lines: vec![LineRequestBuilder::new().build()],
        }
    }

    /// Sets the establishment ID
    pub fn with_establishment_id(mut self, id: EstablishmentId) -> Self {
        self.establishment_id = id;
        self
    }

    /// Sets the order ID
    pub fn with_order_id(mut self, id: Option<OrderId>) -> Self {
        self.order_id = id;
        self
    }

    /// Sets the customer account
    pub fn with_customer_id(mut self, id: AccountId) -> Self {
        self.customer_id = id;
        self
    }

    /// Sets the currency
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Replaces the line set
    pub fn with_lines(mut self, lines: Vec<LineRequest>) -> Self {
        self.lines = lines;
        self
    }

    /// Appends a line
    pub fn with_line(mut self, line: LineRequest) -> Self {
        self.lines.push(line);
        self
    }

    /// Removes all lines, for validation failure tests
    pub fn with_no_lines(mut self) -> Self {
        self.lines.clear();
        self
    }

    /// Builds the creation command
    pub fn build(self) -> CreateInvoice {
        CreateInvoice {
            establishment_id: self.establishment_id,
            order_id: self.order_id,
            customer_id: self.customer_id,
            vendor_id: self.vendor_id,
            issue_date: Some(TemporalFixtures::issue_date()),
            due_date: Some(TemporalFixtures::due_date()),
            currency: self.currency,
            po_number: self.po_number,
            notes: self.notes,
            lines: self.lines,
        }
    }
}

/// Builder for establishments
pub struct EstablishmentBuilder {
    id: EstablishmentId,
    name: String,
    country_code: String,
    tax_id: Option<String>,
    is_active: bool,
}

impl Default for EstablishmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EstablishmentBuilder {
    /// Creates a new builder with a random company name
    pub fn new() -> Self {
        Self {
            id: IdFixtures::establishment_id(),
            name: CompanyName().fake(),
            country_code: StringFixtures::country_code().to_string(),
            tax_id: None,
            is_active: true,
        }
    }

    /// Sets the establishment ID
    pub fn with_id(mut self, id: EstablishmentId) -> Self {
        self.id = id;
        self
    }

    /// Sets the legal name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the country code
    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = code.into();
        self
    }

    /// Marks the establishment inactive
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Builds the establishment
    pub fn build(self) -> Establishment {
        let mut establishment = Establishment::new(self.id, self.name, self.country_code);
        establishment.tax_id = self.tax_id;
        establishment.is_active = self.is_active;
        establishment
    }
}

/// Builder for order summaries seeded into the payment tests
pub struct OrderSummaryBuilder {
    id: OrderId,
    buyer_account_id: AccountId,
    po_number: Option<String>,
    total_amount: Money,
    status: OrderStatus,
}

impl Default for OrderSummaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderSummaryBuilder {
    /// Creates a new builder for a pending order
    pub fn new() -> Self {
        Self {
            id: IdFixtures::order_id(),
            buyer_account_id: IdFixtures::buyer_id(),
            po_number: Some(StringFixtures::po_number().to_string()),
            total_amount: MoneyFixtures::eur_order_total(),
            status: OrderStatus::Pending,
        }
    }

    /// Sets the order ID
    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = id;
        self
    }

    /// Sets the buyer account
    pub fn with_buyer(mut self, id: AccountId) -> Self {
        self.buyer_account_id = id;
        self
    }

    /// Sets the order total
    pub fn with_total(mut self, total: Money) -> Self {
        self.total_amount = total;
        self
    }

    /// Sets the status
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    /// Builds the order summary
    pub fn build(self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            buyer_account_id: self.buyer_account_id,
            po_number: self.po_number,
            total_amount: self.total_amount,
            status: self.status,
        }
    }
}

/// Builder for credit lines
pub struct CreditLimitBuilder {
    account_id: AccountId,
    approved_limit: Money,
    current_balance: Option<Money>,
    cost_center_id: Option<String>,
    is_active: bool,
}

impl Default for CreditLimitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CreditLimitBuilder {
    /// Creates a new builder for an unused EUR 5000 line
    pub fn new() -> Self {
        Self {
            account_id: IdFixtures::buyer_id(),
            approved_limit: MoneyFixtures::eur_credit_limit(),
            current_balance: None,
            cost_center_id: None,
            is_active: true,
        }
    }

    /// Sets the account
    pub fn with_account(mut self, id: AccountId) -> Self {
        self.account_id = id;
        self
    }

    /// Sets the approved limit
    pub fn with_approved_limit(mut self, limit: Money) -> Self {
        self.approved_limit = limit;
        self
    }

    /// Sets the used balance
    pub fn with_balance(mut self, balance: Money) -> Self {
        self.current_balance = Some(balance);
        self
    }

    /// Scopes the line to a cost center
    pub fn with_cost_center(mut self, cost_center_id: impl Into<String>) -> Self {
        self.cost_center_id = Some(cost_center_id.into());
        self
    }

    /// Marks the line inactive
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Builds the credit line
    pub fn build(self) -> CreditLimit {
        let mut limit = CreditLimit::open(self.account_id, self.approved_limit);
        if let Some(balance) = self.current_balance {
            limit.current_balance = balance;
        }
        limit.cost_center_id = self.cost_center_id;
        limit.is_active = self.is_active;
        limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_builder_defaults() {
        let cmd = CreateInvoiceBuilder::new().build();
        assert_eq!(cmd.lines.len(), 1);
        assert_eq!(cmd.currency, Currency::EUR);
        assert_eq!(cmd.customer_id, IdFixtures::buyer_id());
    }

    #[test]
    fn test_line_builder_overrides() {
        let line = LineRequestBuilder::new()
            .with_quantity(3)
            .with_unit_price(dec!(33.33))
            .with_tax_class(tax_class::REDUCED)
            .build();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, dec!(33.33));
        assert_eq!(line.tax_class, "REDUCED");
    }

    #[test]
    fn test_credit_limit_builder_sets_balance() {
        let limit = CreditLimitBuilder::new()
            .with_balance(Money::new(dec!(1200.00), Currency::EUR))
            .build();
        assert_eq!(limit.current_balance.amount(), dec!(1200.00));
        assert_eq!(limit.available().amount(), dec!(3800.00));
    }

    #[test]
    fn test_order_builder_defaults_pending() {
        let order = OrderSummaryBuilder::new().build();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.total_amount.is_positive());
    }
}
