//! Settlement batch XML parser
//!
//! Expected document shape (outer wrapper elements are ignored):
//!   <Batch>
//!     <BatchDate>2024-01-02</BatchDate>
//!     <CardType identType="VISA" quantity="3" grossAmount="100.00" netAmount="97.00">
//!       <Charge><ChargeAmt>3.00</ChargeAmt></Charge>
//!     </CardType>
//!   </Batch>
//!
//! One transaction per `CardType`, in document order. The batch date applies to
//! every card line of its batch, wherever the `BatchDate` element appears in it.

use std::fmt;
use std::fs;
use std::path::Path;

use cardbatch_core::{BatchDate, CardTransaction};
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};

use crate::error::IngestError;

const BATCH: &[u8] = b"Batch";
const BATCH_DATE: &[u8] = b"BatchDate";
const CARD_TYPE: &[u8] = b"CardType";
const CHARGE_AMT: &[u8] = b"ChargeAmt";

#[derive(Debug)]
struct CardLine {
    card_type: String,
    quantity: u32,
    gross: f64,
    net: f64,
    fee: Option<f64>,
}

#[derive(Debug, Default)]
struct OpenBatch {
    date: Option<String>,
    /// Completed card lines with their fee
    cards: Vec<(CardLine, f64)>,
}

enum Capture {
    Date(String),
    Fee(String),
}

/// Parse batch XML text into card transactions.
pub fn parse_batch_xml(xml: &str) -> Result<Vec<CardTransaction>, IngestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut out = Vec::new();
    let mut batch: Option<OpenBatch> = None;
    let mut batch_depth = 0usize;
    let mut card: Option<CardLine> = None;
    let mut capture: Option<Capture> = None;

    loop {
        {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| xml_error(reader.error_position(), e))?;
            let at = reader.buffer_position();
            let decoder = reader.decoder();

            match event {
                Event::Start(ref e) => match e.name().as_ref() {
                    BATCH => {
                        batch_depth += 1;
                        if batch_depth == 1 {
                            batch = Some(OpenBatch::default());
                        }
                    }
                    BATCH_DATE => {
                        if batch.as_ref().is_some_and(|b| b.date.is_none()) && capture.is_none() {
                            capture = Some(Capture::Date(String::new()));
                        }
                    }
                    CARD_TYPE => {
                        if batch.is_some() && card.is_none() {
                            card = Some(card_line(e, decoder, at)?);
                        }
                    }
                    CHARGE_AMT => {
                        if card.as_ref().is_some_and(|c| c.fee.is_none()) && capture.is_none() {
                            capture = Some(Capture::Fee(String::new()));
                        }
                    }
                    _ => {}
                },
                Event::Empty(ref e) => match e.name().as_ref() {
                    CARD_TYPE if batch.is_some() && card.is_none() => {
                        let line = card_line(e, decoder, at)?;
                        return Err(IngestError::MissingFee {
                            card_type: line.card_type,
                        });
                    }
                    BATCH_DATE => {
                        if let Some(b) = batch.as_mut() {
                            if b.date.is_none() {
                                b.date = Some(String::new());
                            }
                        }
                    }
                    CHARGE_AMT => {
                        if let Some(c) = card.as_mut() {
                            if c.fee.is_none() {
                                c.fee = Some(parse_amount("ChargeAmt", "")?);
                            }
                        }
                    }
                    _ => {}
                },
                Event::Text(ref e) => {
                    if let Some(s) = captured(&mut capture) {
                        s.push_str(&e.decode().map_err(|err| xml_error(at, err))?);
                    }
                }
                Event::CData(ref e) => {
                    if let Some(s) = captured(&mut capture) {
                        s.push_str(&e.decode().map_err(|err| xml_error(at, err))?);
                    }
                }
                Event::GeneralRef(ref e) => {
                    if let Some(s) = captured(&mut capture) {
                        s.push_str(&resolve_reference(e).map_err(|msg| xml_error(at, msg))?);
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    BATCH_DATE => {
                        if let Some(Capture::Date(text)) = capture.take() {
                            if let Some(b) = batch.as_mut() {
                                b.date = Some(text);
                            }
                        }
                    }
                    CHARGE_AMT => {
                        if let Some(Capture::Fee(text)) = capture.take() {
                            if let Some(c) = card.as_mut() {
                                c.fee = Some(parse_amount("ChargeAmt", &text)?);
                            }
                        }
                    }
                    CARD_TYPE => {
                        if let Some(line) = card.take() {
                            let fee = line.fee.ok_or_else(|| IngestError::MissingFee {
                                card_type: line.card_type.clone(),
                            })?;
                            if let Some(b) = batch.as_mut() {
                                b.cards.push((line, fee));
                            }
                        }
                    }
                    BATCH => {
                        batch_depth = batch_depth.saturating_sub(1);
                        if batch_depth == 0 {
                            if let Some(done) = batch.take() {
                                let date = BatchDate::parse(done.date.as_deref().unwrap_or(""));
                                for (line, fee) in done.cards {
                                    out.push(CardTransaction::new(
                                        date.clone(),
                                        line.card_type,
                                        line.quantity,
                                        line.gross,
                                        line.net,
                                        fee,
                                    ));
                                }
                            }
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        buf.clear();
    }

    Ok(out)
}

/// Read and parse a batch file, reporting why it could not be used.
pub fn parse_batch_file(path: &Path) -> Result<Vec<CardTransaction>, IngestError> {
    let xml = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_batch_xml(&xml)
}

/// Failure-tolerant ingestion: a file that cannot be parsed contributes no
/// transactions, and the reason is logged.
pub fn read_batch_file(path: &Path) -> Vec<CardTransaction> {
    match parse_batch_file(path) {
        Ok(txns) => {
            tracing::debug!(
                file = %path.display(),
                count = txns.len(),
                mismatched = mismatched_lines(&txns),
                "parsed batch file"
            );
            txns
        }
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "skipping unreadable batch file");
            Vec::new()
        }
    }
}

/// Card lines whose net differs from gross minus fee by a cent or more.
/// Diagnostic only; stated amounts are never corrected.
pub fn mismatched_lines(txns: &[CardTransaction]) -> usize {
    txns.iter()
        .filter(|t| t.fee_discrepancy().abs() >= 0.005)
        .count()
}

fn xml_error(position: u64, err: impl fmt::Display) -> IngestError {
    IngestError::Xml {
        position,
        message: err.to_string(),
    }
}

fn captured(capture: &mut Option<Capture>) -> Option<&mut String> {
    match capture {
        Some(Capture::Date(s)) | Some(Capture::Fee(s)) => Some(s),
        None => None,
    }
}

/// Text for `&#NN;`, `&#xNN;` or one of the five predefined entities.
fn resolve_reference(e: &BytesRef<'_>) -> Result<String, String> {
    if let Some(ch) = e.resolve_char_ref().map_err(|err| err.to_string())? {
        return Ok(ch.to_string());
    }
    let name = e.decode().map_err(|err| err.to_string())?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| format!("unknown entity &{name};"))
}

/// Reads the card attributes. Duplicate or malformed attributes are XML errors.
fn card_line(e: &BytesStart<'_>, decoder: Decoder, at: u64) -> Result<CardLine, IngestError> {
    let mut ident = None;
    let mut quantity = None;
    let mut gross = None;
    let mut net = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(at, err))?;
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|err| xml_error(at, err))?
            .into_owned();
        match attr.key.as_ref() {
            b"identType" => ident = Some(value),
            b"quantity" => quantity = Some(value),
            b"grossAmount" => gross = Some(value),
            b"netAmount" => net = Some(value),
            _ => {}
        }
    }

    let card_type = required(ident, "identType")?;
    let quantity = required(quantity, "quantity")?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|_| IngestError::InvalidNumber {
            field: "quantity",
            value: quantity.clone(),
        })?;

    Ok(CardLine {
        card_type,
        quantity,
        gross: parse_amount("grossAmount", &required(gross, "grossAmount")?)?,
        net: parse_amount("netAmount", &required(net, "netAmount")?)?,
        fee: None,
    })
}

fn required(value: Option<String>, attribute: &'static str) -> Result<String, IngestError> {
    value.ok_or(IngestError::MissingAttribute {
        element: "CardType",
        attribute,
    })
}

fn parse_amount(field: &'static str, raw: &str) -> Result<f64, IngestError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| IngestError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}
