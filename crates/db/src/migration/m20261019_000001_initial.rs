//! Initial database migration.
//!
//! Creates the billing schema: contacts, the four numbered document families
//! with their shared line item table, payments, credit applications,
//! expenses, numbering sequences, and the recurring expense run log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: PARTIES
        // ============================================================
        db.execute_unprepared(CONTACTS_SQL).await?;

        // ============================================================
        // PART 3: DOCUMENTS
        // ============================================================
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(ESTIMATES_SQL).await?;
        db.execute_unprepared(PROPOSALS_SQL).await?;
        db.execute_unprepared(CREDIT_NOTES_SQL).await?;
        db.execute_unprepared(LINE_ITEMS_SQL).await?;

        // ============================================================
        // PART 4: RECONCILIATION
        // ============================================================
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(CREDIT_NOTE_APPLICATIONS_SQL).await?;

        // ============================================================
        // PART 5: EXPENSES
        // ============================================================
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(RECURRING_EXPENSE_RUNS_SQL).await?;

        // ============================================================
        // PART 6: NUMBERING
        // ============================================================
        db.execute_unprepared(DOCUMENT_SEQUENCES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE estimate_status AS ENUM (
    'Draft',
    'Sent',
    'Expired',
    'Declined',
    'Accepted',
    'Invoiced'
);

CREATE TYPE invoice_status AS ENUM (
    'Draft',
    'Unpaid',
    'Partially Paid',
    'Paid',
    'Overdue'
);

CREATE TYPE credit_note_status AS ENUM ('Open', 'Closed', 'Void');

CREATE TYPE proposal_status AS ENUM (
    'Draft',
    'Sent',
    'Open',
    'Revised',
    'Declined',
    'Accepted'
);

CREATE TYPE discount_calc AS ENUM ('before_tax', 'after_tax');

CREATE TYPE expense_frequency AS ENUM ('Weekly', 'Monthly', 'Yearly');
";

const CONTACTS_SQL: &str = r"
CREATE TABLE contacts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255),
    phone VARCHAR(50),
    company VARCHAR(255),
    address TEXT,
    city VARCHAR(100),
    country VARCHAR(100),
    currency CHAR(3),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_contacts_name ON contacts(name);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    invoice_number VARCHAR(32) NOT NULL UNIQUE,
    contact_id UUID NOT NULL REFERENCES contacts(id) ON DELETE RESTRICT,
    issue_date DATE NOT NULL,
    due_date DATE,
    currency CHAR(3),
    status invoice_status NOT NULL DEFAULT 'Unpaid',
    sale_agent VARCHAR(255),
    sub_total NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount_val NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount_type VARCHAR(20),
    discount_calc discount_calc NOT NULL DEFAULT 'after_tax',
    total_tax NUMERIC(15, 2) NOT NULL DEFAULT 0,
    adjustment NUMERIC(15, 2) NOT NULL DEFAULT 0,
    total_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    amount_paid NUMERIC(15, 2) NOT NULL DEFAULT 0,
    terms TEXT,
    client_note TEXT,
    admin_note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_invoices_total_non_negative CHECK (total_amount >= 0),
    CONSTRAINT chk_invoices_paid_non_negative CHECK (amount_paid >= 0)
);

CREATE INDEX idx_invoices_contact ON invoices(contact_id);
CREATE INDEX idx_invoices_status ON invoices(status);
";

const ESTIMATES_SQL: &str = r"
CREATE TABLE estimates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    estimate_number VARCHAR(32) NOT NULL UNIQUE,
    contact_id UUID NOT NULL REFERENCES contacts(id) ON DELETE RESTRICT,
    issue_date DATE NOT NULL,
    valid_until DATE,
    reference VARCHAR(100),
    currency CHAR(3),
    status estimate_status NOT NULL DEFAULT 'Draft',
    sale_agent VARCHAR(255),
    sub_total NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount_val NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount_type VARCHAR(20),
    discount_calc discount_calc NOT NULL DEFAULT 'after_tax',
    total_tax NUMERIC(15, 2) NOT NULL DEFAULT 0,
    adjustment NUMERIC(15, 2) NOT NULL DEFAULT 0,
    total_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    terms TEXT,
    client_note TEXT,
    admin_note TEXT,
    invoice_id UUID REFERENCES invoices(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_estimates_contact ON estimates(contact_id);
CREATE INDEX idx_estimates_status ON estimates(status);
";

const PROPOSALS_SQL: &str = r"
CREATE TABLE proposals (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    proposal_number VARCHAR(32) NOT NULL UNIQUE,
    contact_id UUID NOT NULL REFERENCES contacts(id) ON DELETE RESTRICT,
    subject VARCHAR(255) NOT NULL,
    proposal_date DATE NOT NULL,
    open_till DATE,
    currency CHAR(3),
    status proposal_status NOT NULL DEFAULT 'Draft',
    sub_total NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount_val NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount_type VARCHAR(20),
    discount_calc discount_calc NOT NULL DEFAULT 'after_tax',
    total_tax NUMERIC(15, 2) NOT NULL DEFAULT 0,
    adjustment NUMERIC(15, 2) NOT NULL DEFAULT 0,
    total_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    converted_invoice_id UUID REFERENCES invoices(id) ON DELETE SET NULL,
    converted_estimate_id UUID REFERENCES estimates(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_proposals_single_conversion
        CHECK (converted_invoice_id IS NULL OR converted_estimate_id IS NULL)
);

CREATE INDEX idx_proposals_contact ON proposals(contact_id);
";

const CREDIT_NOTES_SQL: &str = r"
CREATE TABLE credit_notes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    credit_note_number VARCHAR(32) NOT NULL UNIQUE,
    contact_id UUID NOT NULL REFERENCES contacts(id) ON DELETE RESTRICT,
    credit_date DATE NOT NULL,
    reference VARCHAR(100),
    currency CHAR(3),
    status credit_note_status NOT NULL DEFAULT 'Open',
    sub_total NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount_val NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount_type VARCHAR(20),
    discount_calc discount_calc NOT NULL DEFAULT 'after_tax',
    total_tax NUMERIC(15, 2) NOT NULL DEFAULT 0,
    adjustment NUMERIC(15, 2) NOT NULL DEFAULT 0,
    total_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    remaining_credits NUMERIC(15, 2) NOT NULL DEFAULT 0,
    terms TEXT,
    client_note TEXT,
    admin_note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_credit_notes_remaining_non_negative CHECK (remaining_credits >= 0),
    CONSTRAINT chk_credit_notes_remaining_within_total CHECK (remaining_credits <= total_amount),
    CONSTRAINT chk_credit_notes_exhausted_closed
        CHECK (remaining_credits > 0 OR status = 'Closed')
);

CREATE INDEX idx_credit_notes_contact ON credit_notes(contact_id);
";

const LINE_ITEMS_SQL: &str = r"
-- Items of every document family; exactly one parent column is set
CREATE TABLE line_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    estimate_id UUID REFERENCES estimates(id) ON DELETE CASCADE,
    invoice_id UUID REFERENCES invoices(id) ON DELETE CASCADE,
    credit_note_id UUID REFERENCES credit_notes(id) ON DELETE CASCADE,
    proposal_id UUID REFERENCES proposals(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    description VARCHAR(500) NOT NULL,
    long_description TEXT,
    qty NUMERIC(15, 4) NOT NULL DEFAULT 1,
    rate NUMERIC(15, 2) NOT NULL DEFAULT 0,
    tax NUMERIC(5, 2) NOT NULL DEFAULT 0,
    amount NUMERIC(15, 2) NOT NULL DEFAULT 0,

    CONSTRAINT chk_line_items_single_parent
        CHECK (num_nonnulls(estimate_id, invoice_id, credit_note_id, proposal_id) = 1)
);

CREATE INDEX idx_line_items_estimate ON line_items(estimate_id, position) WHERE estimate_id IS NOT NULL;
CREATE INDEX idx_line_items_invoice ON line_items(invoice_id, position) WHERE invoice_id IS NOT NULL;
CREATE INDEX idx_line_items_credit_note ON line_items(credit_note_id, position) WHERE credit_note_id IS NOT NULL;
CREATE INDEX idx_line_items_proposal ON line_items(proposal_id, position) WHERE proposal_id IS NOT NULL;
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    contact_id UUID NOT NULL REFERENCES contacts(id) ON DELETE RESTRICT,
    amount NUMERIC(15, 2) NOT NULL,
    payment_mode VARCHAR(50),
    transaction_id VARCHAR(255),
    payment_date DATE NOT NULL,
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_payments_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_payments_invoice ON payments(invoice_id);
CREATE INDEX idx_payments_date ON payments(payment_date DESC);
";

const CREDIT_NOTE_APPLICATIONS_SQL: &str = r"
-- Append-only record of credit consumed against invoices
CREATE TABLE credit_note_applications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    credit_note_id UUID NOT NULL REFERENCES credit_notes(id) ON DELETE RESTRICT,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE RESTRICT,
    amount NUMERIC(15, 2) NOT NULL,
    applied_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_credit_applications_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_credit_applications_note ON credit_note_applications(credit_note_id);
CREATE INDEX idx_credit_applications_invoice ON credit_note_applications(invoice_id);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    expense_name VARCHAR(255),
    category VARCHAR(100),
    entry_date DATE NOT NULL,
    amount NUMERIC(15, 2) NOT NULL,
    currency CHAR(3),
    customer_id UUID REFERENCES contacts(id) ON DELETE SET NULL,
    invoice_id UUID REFERENCES invoices(id) ON DELETE SET NULL,
    reference_no VARCHAR(100),
    payment_mode VARCHAR(50),
    billable BOOLEAN NOT NULL DEFAULT false,
    note TEXT,
    receipt_path VARCHAR(500),
    is_recurring BOOLEAN NOT NULL DEFAULT false,
    frequency expense_frequency,
    -- Root of the recurrence chain; no FK so the chain survives deleting its root
    recurring_source_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_expenses_amount_non_negative CHECK (amount >= 0),
    CONSTRAINT chk_expenses_recurring_frequency CHECK (NOT is_recurring OR frequency IS NOT NULL)
);

CREATE INDEX idx_expenses_entry_date ON expenses(entry_date DESC);
CREATE INDEX idx_expenses_recurring ON expenses(is_recurring) WHERE is_recurring = true;
";

const RECURRING_EXPENSE_RUNS_SQL: &str = r"
-- One row per recurrence chain and period; guards against duplicate clones
CREATE TABLE recurring_expense_runs (
    root_expense_id UUID NOT NULL,
    period_key VARCHAR(16) NOT NULL,
    expense_id UUID REFERENCES expenses(id) ON DELETE SET NULL,
    run_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    PRIMARY KEY (root_expense_id, period_key)
);
";

const DOCUMENT_SEQUENCES_SQL: &str = r"
CREATE TABLE document_sequences (
    family VARCHAR(32) PRIMARY KEY,
    last_number VARCHAR(32),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

INSERT INTO document_sequences (family) VALUES
    ('estimate'),
    ('invoice'),
    ('credit_note'),
    ('proposal');
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS document_sequences CASCADE;
DROP TABLE IF EXISTS recurring_expense_runs CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS credit_note_applications CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS line_items CASCADE;
DROP TABLE IF EXISTS credit_notes CASCADE;
DROP TABLE IF EXISTS proposals CASCADE;
DROP TABLE IF EXISTS estimates CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS contacts CASCADE;

DROP TYPE IF EXISTS expense_frequency;
DROP TYPE IF EXISTS discount_calc;
DROP TYPE IF EXISTS proposal_status;
DROP TYPE IF EXISTS credit_note_status;
DROP TYPE IF EXISTS invoice_status;
DROP TYPE IF EXISTS estimate_status;
";
