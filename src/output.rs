use std::io::{self, Write};

use chrono::{DateTime, Utc};
use venue::{OrderIntent, Position};

use crate::types::CycleResult;

/// Single terminal line rewritten in place while a position is monitored.
pub struct StatusLine {
    out: Box<dyn Write + Send + Sync>,
    dirty: bool,
}

impl StatusLine {
    pub fn new(out: impl Write + Send + Sync + 'static) -> Self {
        Self {
            out: Box::new(out),
            dirty: false,
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Discards everything; used when cycle results go to stdout as JSON.
    pub fn sink() -> Self {
        Self::new(io::sink())
    }

    pub fn update(&mut self, position: &Position) -> io::Result<()> {
        write!(self.out, "\r\x1b[2K{}", format_status(Utc::now(), position))?;
        self.out.flush()?;
        self.dirty = true;
        Ok(())
    }

    /// End the rewritten line so later output starts on a fresh one.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.dirty {
            writeln!(self.out)?;
            self.out.flush()?;
            self.dirty = false;
        }
        Ok(())
    }
}

/// `2026-01-01 12:00:00 - Size: -15 (1.50x), Entry: 100.00, Balance: 1.00000000, PNL: +0.00001234`
pub fn format_status(now: DateTime<Utc>, position: &Position) -> String {
    let pnl = position.unrealized_pnl;
    let sign = if pnl.is_sign_negative() && !pnl.is_zero() {
        '-'
    } else {
        '+'
    };
    format!(
        "{} - Size: {} ({:.2}x), Entry: {:.2}, Balance: {:.8}, PNL: {}{:.8}",
        now.format("%Y-%m-%d %H:%M:%S"),
        position.signed_size(),
        position.leverage,
        position.entry_price,
        position.wallet_balance,
        sign,
        pnl.abs()
    )
}

/// Write a closed cycle as one line: JSON or TSV
/// (side, quantity, entry, exit, pnl).
pub fn write_cycle<W: Write>(writer: &mut W, result: &CycleResult, json_mode: bool) -> io::Result<()> {
    if json_mode {
        serde_json::to_writer(&mut *writer, result)?;
        writeln!(writer)?;
    } else {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            result.side, result.quantity, result.entry_price, result.exit_price, result.closed_pnl
        )?;
    }
    writer.flush()
}

/// Write ladder intents one per line: JSON or TSV (side, price, qty).
pub fn write_intents<W: Write>(writer: &mut W, intents: &[OrderIntent], json_mode: bool) -> io::Result<()> {
    for intent in intents {
        if json_mode {
            serde_json::to_writer(&mut *writer, intent)?;
            writeln!(writer)?;
        } else {
            writeln!(writer, "{}\t{}\t{}", intent.side, intent.price, intent.qty)?;
        }
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use venue::{PositionSide, Side};

    fn short_position() -> Position {
        Position {
            symbol: "BTCUSD".into(),
            side: PositionSide::Sell,
            size: 15,
            entry_price: dec!(100),
            unrealized_pnl: dec!(-0.00001234),
            leverage: dec!(1.5),
            wallet_balance: dec!(1),
        }
    }

    #[test]
    fn test_status_line_format() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            format_status(now, &short_position()),
            "2026-01-01 12:00:00 - Size: -15 (1.50x), Entry: 100.00, Balance: 1.00000000, PNL: -0.00001234"
        );
    }

    #[test]
    fn test_status_zero_pnl_has_plus_sign() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let flat = Position::flat("BTCUSD", dec!(2));
        assert!(format_status(now, &flat).ends_with("Size: 0 (0.00x), Entry: 0.00, Balance: 2.00000000, PNL: +0.00000000"));
    }

    #[test]
    fn test_write_cycle_tsv() {
        let result = CycleResult {
            side: Side::Buy,
            quantity: 15,
            entry_price: dec!(98),
            exit_price: dec!(99),
            closed_pnl: dec!(0.0015),
        };
        let mut buf = Vec::new();
        write_cycle(&mut buf, &result, false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Buy\t15\t98\t99\t0.0015\n");
    }

    #[test]
    fn test_write_cycle_json() {
        let result = CycleResult {
            side: Side::Sell,
            quantity: 3,
            entry_price: dec!(100),
            exit_price: dec!(99.5),
            closed_pnl: dec!(1.5),
        };
        let mut buf = Vec::new();
        write_cycle(&mut buf, &result, true).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["side"], "Sell");
        assert_eq!(v["quantity"], 3);
        assert_eq!(v["exit_price"], "99.5");
    }

    #[test]
    fn test_write_intents_tsv() {
        let intents = vec![
            OrderIntent::limit("BTCUSD", Side::Buy, 10, dec!(98)),
            OrderIntent::limit("BTCUSD", Side::Sell, 10, dec!(102)),
        ];
        let mut buf = Vec::new();
        write_intents(&mut buf, &intents, false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Buy\t98\t10\nSell\t102\t10\n");
    }
}
