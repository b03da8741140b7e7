use std::io::Read;
use std::pin::Pin;

use futures::stream::{self, Stream};
use serde::Deserialize;

use crate::domain::traits::CommandStream;
use crate::domain::{Command, CommandKind, Error, Money};

pub struct CsvReader<R: Read> {
    reader: Option<csv::Reader<R>>,
}

impl<R: Read> CsvReader<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Ok(Self { reader: Some(rdr) })
    }
}

/// Internal shape used only for CSV deserialization.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    device: Option<String>,
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    arg: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

fn parse_amount(raw: Option<&str>, kind: &str) -> Result<Option<Money>, Error> {
    raw.map(|v| {
        v.parse::<i64>()
            .map(Money)
            .map_err(|_| Error::Ingestion(format!("{kind}: invalid amount `{v}`")))
    })
    .transpose()
}

impl CsvRow {
    fn into_command(self, line: u64) -> Result<Command, Error> {
        let kind_name = self.kind.trim().to_ascii_lowercase();
        let value = self.value.as_deref();

        let kind = match kind_name.as_str() {
            "register" => CommandKind::Register {
                display_name: self.arg.clone().unwrap_or_default(),
                referral_code: self.value.clone(),
            },
            "login" => CommandKind::Login,
            "logout" => CommandKind::Logout,
            "quiz" => {
                let raw_id = self.arg.as_deref().unwrap_or_default();
                let quiz_id = raw_id
                    .parse::<u32>()
                    .map_err(|_| Error::Ingestion(format!("quiz: invalid quiz id `{raw_id}`")))?;
                CommandKind::AnswerQuiz {
                    quiz_id,
                    answer: self.value.clone().unwrap_or_default(),
                }
            }
            "ad" => CommandKind::WatchAd {
                amount: parse_amount(value, "ad")?,
            },
            "withdraw" => CommandKind::Withdraw {
                amount: parse_amount(value, "withdraw")?
                    .ok_or_else(|| Error::Ingestion("withdraw: amount is required".to_string()))?,
            },
            "admin" => CommandKind::AdminLogin {
                password: self.value.clone().unwrap_or_default(),
            },
            "process" => CommandKind::MarkProcessing,
            "complete" => CommandKind::Complete,
            "reject" => CommandKind::Reject,
            "block" => CommandKind::Block,
            other => {
                return Err(Error::Ingestion(format!(
                    "line {line}: invalid command type: {other}"
                )));
            }
        };

        Ok(Command {
            kind,
            device: self.device,
            payment_number: self.number,
            line,
        })
    }
}

impl<R: Read + Send + 'static> CommandStream for CsvReader<R> {
    type CmdStream = Pin<Box<dyn Stream<Item = Result<Command, Error>> + Send>>;

    fn stream(&mut self) -> Self::CmdStream {
        // a script is replayed once
        let Some(mut reader) = self.reader.take() else {
            return Box::pin(stream::empty());
        };

        let headers = match reader.headers() {
            Ok(h) => h.clone(),
            Err(e) => return Box::pin(stream::iter(vec![Err(Error::from(e))])),
        };

        let iter = reader.into_records().map(move |record| -> Result<Command, Error> {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row: CsvRow = record
                .deserialize(Some(&headers))
                .map_err(|e| Error::Ingestion(format!("line {line}: CSV deserialization error: {e}")))?;
            row.into_command(line)
        });

        Box::pin(stream::iter(iter))
    }
}
