use std::io::Write;

use serde::Serialize;

use crate::domain::{Account, AccountReport, Error, Money};

/// Writes the final account table as CSV, one row per account ordered by payment number.
#[derive(Debug)]
pub struct TableOutput<W: Write> {
    writer: W,
}

impl TableOutput<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TableOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

const HEADER: [&str; 7] = [
    "number",
    "name",
    "balance",
    "total_earned",
    "referral_earnings",
    "ads_watched",
    "referral_count",
];

#[derive(Serialize)]
struct Row<'a> {
    number: &'a str,
    name: &'a str,
    balance: Money,
    total_earned: Money,
    referral_earnings: Money,
    ads_watched: u32,
    referral_count: u32,
}

impl<'a> From<&'a Account> for Row<'a> {
    fn from(account: &'a Account) -> Self {
        Row {
            number: &account.payment_number,
            name: &account.display_name,
            balance: account.balance,
            total_earned: account.total_earned,
            referral_earnings: account.referral_earnings,
            ads_watched: account.ads_watched,
            referral_count: account.referral_count,
        }
    }
}

impl<W: Write> AccountReport for TableOutput<W> {
    fn write_accounts(&mut self, accounts: &[Account]) -> Result<(), Error> {
        let mut sorted: Vec<&Account> = accounts.iter().collect();
        sorted.sort_by(|a, b| a.payment_number.cmp(&b.payment_number));

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut self.writer);
        wtr.write_record(HEADER)?;
        for account in sorted {
            wtr.serialize(Row::from(account))?;
        }
        wtr.flush()?;
        Ok(())
    }
}
