// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unit conversion tool.
//!
//! Linear units convert through one base unit per kind (metre, kilogram,
//! second, litre). Temperatures pivot through Celsius and only convert to
//! other temperatures.

use async_trait::async_trait;
use parley_core::ParleyError;
use serde_json::{Value, json};

use super::calculator::format_number;
use crate::tool::{Tool, ToolOutput, required_str};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Length,
    Mass,
    Time,
    Volume,
    Temperature,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UnitKind::Length => "length",
            UnitKind::Mass => "mass",
            UnitKind::Time => "time",
            UnitKind::Volume => "volume",
            UnitKind::Temperature => "temperature",
        };
        f.write_str(name)
    }
}

/// (aliases, kind, factor to the kind's base unit)
const LINEAR_UNITS: &[(&[&str], UnitKind, f64)] = &[
    (&["mm", "millimeter", "millimeters", "millimetre", "millimetres"], UnitKind::Length, 0.001),
    (&["cm", "centimeter", "centimeters", "centimetre", "centimetres"], UnitKind::Length, 0.01),
    (&["m", "meter", "meters", "metre", "metres"], UnitKind::Length, 1.0),
    (&["km", "kilometer", "kilometers", "kilometre", "kilometres"], UnitKind::Length, 1000.0),
    (&["in", "inch", "inches"], UnitKind::Length, 0.0254),
    (&["ft", "foot", "feet"], UnitKind::Length, 0.3048),
    (&["yd", "yard", "yards"], UnitKind::Length, 0.9144),
    (&["mi", "mile", "miles"], UnitKind::Length, 1609.344),
    (&["mg", "milligram", "milligrams"], UnitKind::Mass, 1e-6),
    (&["g", "gram", "grams"], UnitKind::Mass, 0.001),
    (&["kg", "kilogram", "kilograms", "kilo", "kilos"], UnitKind::Mass, 1.0),
    (&["t", "tonne", "tonnes", "metric ton"], UnitKind::Mass, 1000.0),
    (&["oz", "ounce", "ounces"], UnitKind::Mass, 0.028_349_523_125),
    (&["lb", "lbs", "pound", "pounds"], UnitKind::Mass, 0.453_592_37),
    (&["ms", "millisecond", "milliseconds"], UnitKind::Time, 0.001),
    (&["s", "sec", "secs", "second", "seconds"], UnitKind::Time, 1.0),
    (&["min", "mins", "minute", "minutes"], UnitKind::Time, 60.0),
    (&["h", "hr", "hrs", "hour", "hours"], UnitKind::Time, 3600.0),
    (&["d", "day", "days"], UnitKind::Time, 86_400.0),
    (&["wk", "week", "weeks"], UnitKind::Time, 604_800.0),
    (&["ml", "milliliter", "milliliters", "millilitre", "millilitres"], UnitKind::Volume, 0.001),
    (&["l", "liter", "liters", "litre", "litres"], UnitKind::Volume, 1.0),
    (&["floz", "fl oz", "fluid ounce", "fluid ounces"], UnitKind::Volume, 0.029_573_529_562_5),
    (&["cup", "cups"], UnitKind::Volume, 0.236_588_236_5),
    (&["pt", "pint", "pints"], UnitKind::Volume, 0.473_176_473),
    (&["qt", "quart", "quarts"], UnitKind::Volume, 0.946_352_946),
    (&["gal", "gallon", "gallons"], UnitKind::Volume, 3.785_411_784),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Linear { kind: UnitKind, factor: f64 },
    Temperature(TemperatureUnit),
}

impl Unit {
    fn kind(self) -> UnitKind {
        match self {
            Unit::Linear { kind, .. } => kind,
            Unit::Temperature(_) => UnitKind::Temperature,
        }
    }
}

fn lookup(name: &str) -> Result<Unit, ParleyError> {
    let key = name.trim().to_lowercase();
    let key = key.trim_start_matches('°');
    let temperature = match key {
        "c" | "celsius" | "centigrade" => Some(TemperatureUnit::Celsius),
        "f" | "fahrenheit" => Some(TemperatureUnit::Fahrenheit),
        "k" | "kelvin" => Some(TemperatureUnit::Kelvin),
        _ => None,
    };
    if let Some(unit) = temperature {
        return Ok(Unit::Temperature(unit));
    }
    LINEAR_UNITS
        .iter()
        .find(|(aliases, _, _)| aliases.contains(&key))
        .map(|(_, kind, factor)| Unit::Linear {
            kind: *kind,
            factor: *factor,
        })
        .ok_or_else(|| ParleyError::skill(format!("unknown unit '{}'", name.trim())))
}

fn to_celsius(value: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => value,
        TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        TemperatureUnit::Kelvin => value - 273.15,
    }
}

fn from_celsius(value: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => value,
        TemperatureUnit::Fahrenheit => value * 9.0 / 5.0 + 32.0,
        TemperatureUnit::Kelvin => value + 273.15,
    }
}

/// Significant digits kept for results smaller than one.
const SIGNIFICANT_DIGITS: i32 = 7;

/// Strip float noise from table factors: six decimal places, or seven
/// significant digits when that keeps more of a small result.
fn round_result(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (SIGNIFICANT_DIGITS - 1 - magnitude).max(6);
    let scale = 10f64.powi(decimals);
    if !scale.is_finite() {
        return value;
    }
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Convert `value` between two units of the same kind.
pub fn convert_unit(value: f64, from: &str, to: &str) -> Result<f64, ParleyError> {
    if !value.is_finite() {
        return Err(ParleyError::skill("value must be a finite number"));
    }
    let (source, target) = (lookup(from)?, lookup(to)?);
    let result = match (source, target) {
        (Unit::Temperature(a), Unit::Temperature(b)) => from_celsius(to_celsius(value, a), b),
        (
            Unit::Linear {
                kind: ka,
                factor: fa,
            },
            Unit::Linear {
                kind: kb,
                factor: fb,
            },
        ) if ka == kb => value * fa / fb,
        _ => {
            return Err(ParleyError::skill(format!(
                "cannot convert {} ({}) to {} ({})",
                from.trim(),
                source.kind(),
                to.trim(),
                target.kind()
            )));
        }
    };
    Ok(round_result(result))
}

/// Converts between units of length, mass, time, volume and temperature.
pub struct ConvertUnitsTool;

#[async_trait]
impl Tool for ConvertUnitsTool {
    fn name(&self) -> &str {
        "convert_units"
    }

    fn description(&self) -> &str {
        "Convert a value between units of length, mass, time, volume or temperature"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "value": { "type": "number", "description": "Quantity to convert" },
                "from": { "type": "string", "description": "Source unit, e.g. km, lb, f" },
                "to": { "type": "string", "description": "Target unit, e.g. mi, kg, c" }
            },
            "required": ["value", "from", "to"]
        })
    }

    async fn invoke(&self, input: Value) -> Result<ToolOutput, ParleyError> {
        // Models sometimes send numbers as strings.
        let value = match &input["value"] {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| ParleyError::skill("missing or non-numeric 'value' parameter"))?;
        let from = required_str(&input, "from")?;
        let to = required_str(&input, "to")?;

        let result = convert_unit(value, from, to)?;
        Ok(ToolOutput::ok(format!(
            "{} {} = {} {}",
            format_number(value),
            from.trim(),
            format_number(result),
            to.trim()
        )))
    }
}
