//! Conversion of raw provider records into the internal model.
//!
//! All conversions are total: a missing or non-numeric field fails with
//! [`MarketDataError::Conversion`] naming the provider field, never with a
//! defaulted value.

use std::collections::HashMap;

use crate::catalog::to_internal_id;
use crate::errors::MarketDataError;
use crate::models::{Pair, PairId, PriceField, Rate, Tick, Value};
use crate::provider::{RawCandle, RawInstrument, RawNumber, RawPrice};

fn require<'a>(
    field: &str,
    raw: Option<&'a RawNumber>,
) -> Result<&'a RawNumber, MarketDataError> {
    raw.ok_or_else(|| MarketDataError::conversion(field, "missing"))
}

fn to_f64(field: &str, raw: Option<&RawNumber>) -> Result<f64, MarketDataError> {
    let raw = require(field, raw)?;
    raw.as_f64()
        .ok_or_else(|| MarketDataError::conversion(field, raw.to_string()))
}

fn to_i64(field: &str, raw: Option<&RawNumber>) -> Result<i64, MarketDataError> {
    let raw = require(field, raw)?;
    raw.as_i64()
        .ok_or_else(|| MarketDataError::conversion(field, raw.to_string()))
}

/// Convert an instrument listing entry into a [`Pair`].
pub fn to_pair(raw: &RawInstrument) -> Result<Pair, MarketDataError> {
    let internal_id = to_internal_id(&raw.instrument)?;
    Ok(Pair::new(
        internal_id,
        raw.instrument.as_str().into(),
        to_f64("pip", raw.pip.as_ref())?,
        to_i64("maxTradeUnits", raw.max_trade_units.as_ref())?,
        to_f64("precision", raw.precision.as_ref())?,
        to_f64("marginRate", raw.margin_rate.as_ref())?,
    ))
}

/// Convert a price snapshot into one [`Tick`] spanning every pair in it.
///
/// The tick is stamped with the first price's time. Prices within one
/// snapshot are not guaranteed to share a timestamp, so later entries may
/// be skewed by up to the spread of the batch.
pub fn to_tick(prices: &[RawPrice]) -> Result<Tick, MarketDataError> {
    let first = prices
        .first()
        .ok_or_else(|| MarketDataError::conversion("prices", "empty snapshot"))?;

    let mut values = HashMap::with_capacity(prices.len());
    for price in prices {
        let pair_id = to_internal_id(&price.instrument)?;
        let value = Value::new(
            to_f64("bid", price.bid.as_ref())?,
            to_f64("ask", price.ask.as_ref())?,
        );
        values.insert(pair_id, value);
    }
    Ok(Tick::new(values, first.time))
}

/// Provider fields holding one quote point of a candle.
struct QuoteFields<'a> {
    bid: (&'static str, Option<&'a RawNumber>),
    ask: (&'static str, Option<&'a RawNumber>),
    mid: (&'static str, Option<&'a RawNumber>),
}

fn quote_fields(candle: &RawCandle, field: PriceField) -> QuoteFields<'_> {
    match field {
        PriceField::Open => QuoteFields {
            bid: ("openBid", candle.open_bid.as_ref()),
            ask: ("openAsk", candle.open_ask.as_ref()),
            mid: ("openMid", candle.open_mid.as_ref()),
        },
        PriceField::Close => QuoteFields {
            bid: ("closeBid", candle.close_bid.as_ref()),
            ask: ("closeAsk", candle.close_ask.as_ref()),
            mid: ("closeMid", candle.close_mid.as_ref()),
        },
        PriceField::High => QuoteFields {
            bid: ("highBid", candle.high_bid.as_ref()),
            ask: ("highAsk", candle.high_ask.as_ref()),
            mid: ("highMid", candle.high_mid.as_ref()),
        },
        PriceField::Low => QuoteFields {
            bid: ("lowBid", candle.low_bid.as_ref()),
            ask: ("lowAsk", candle.low_ask.as_ref()),
            mid: ("lowMid", candle.low_mid.as_ref()),
        },
    }
}

/// Read one quote point of a candle.
///
/// Midpoint candles have no bid/ask split; their mid value is used for both.
pub fn to_value(candle: &RawCandle, field: PriceField) -> Result<Value, MarketDataError> {
    let fields = quote_fields(candle, field);
    let side = |(name, raw): (&'static str, Option<&RawNumber>)| match (raw, fields.mid.1) {
        (Some(_), _) => to_f64(name, raw),
        (None, Some(_)) => to_f64(fields.mid.0, fields.mid.1),
        (None, None) => to_f64(name, None),
    };
    Ok(Value::new(side(fields.bid)?, side(fields.ask)?))
}

/// Single-pair tick at the candle's time, from the selected quote point.
pub fn to_tick_value(
    pair_id: &PairId,
    candle: &RawCandle,
    field: PriceField,
) -> Result<Tick, MarketDataError> {
    Ok(Tick::single(
        pair_id.clone(),
        to_value(candle, field)?,
        candle.time,
    ))
}

/// Convert a candle into a [`Rate`].
pub fn to_rate(pair_id: &PairId, candle: &RawCandle) -> Result<Rate, MarketDataError> {
    Ok(Rate::new(
        pair_id.clone(),
        candle.time,
        to_value(candle, PriceField::Open)?,
        to_value(candle, PriceField::Close)?,
        to_value(candle, PriceField::High)?,
        to_value(candle, PriceField::Low)?,
    ))
}
