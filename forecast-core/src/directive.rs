//! Classification of input lines into directives.
//!
//! Resolution directives (`TARGET`, `WEATHER`, `REVERSE`) run in input order
//! during the immediate phase. Statistic directives are buffered into one
//! queue per statistic and run afterwards. The first `REVERSE` line ends the
//! input.

/// Where a resolution directive gets its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A local JSON file.
    File(String),
    /// A live service call with the given operand text.
    Live(String),
}

/// A directive executed during the immediate phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Target(Source),
    Weather(Source),
    Reverse(Source),
}

impl Directive {
    /// Input verb pair, used in log lines and NO_COORDINATES reports.
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Target(Source::File(_)) => "TARGET FILE",
            Directive::Target(Source::Live(_)) => "TARGET NOMINATIM",
            Directive::Weather(Source::File(_)) => "WEATHER FILE",
            Directive::Weather(Source::Live(_)) => "WEATHER NWS",
            Directive::Reverse(Source::File(_)) => "REVERSE FILE",
            Directive::Reverse(Source::Live(_)) => "REVERSE NOMINATIM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Fahrenheit,
    Celsius,
}

impl Scale {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "F" => Some(Scale::Fahrenheit),
            "C" => Some(Scale::Celsius),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

impl Extremum {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "MAX" => Some(Extremum::Max),
            "MIN" => Some(Extremum::Min),
            _ => None,
        }
    }
}

/// Horizon and selector shared by every statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub hours: i64,
    pub extremum: Extremum,
}

/// A temperature statistic: air or perceived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureQuery {
    pub scale: Scale,
    pub window: Window,
}

/// A parsed directive script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub immediate: Vec<Directive>,
    pub temperature: Vec<TemperatureQuery>,
    pub feels_like: Vec<TemperatureQuery>,
    pub humidity: Vec<Window>,
    pub wind: Vec<Window>,
    pub precipitation: Vec<Window>,
}

impl Script {
    pub fn statistic_count(&self) -> usize {
        self.temperature.len()
            + self.feels_like.len()
            + self.humidity.len()
            + self.wind.len()
            + self.precipitation.len()
    }
}

/// Classify lines until the first `REVERSE` directive (inclusive).
///
/// Lines are pulled lazily, so an interactive reader is not asked for more
/// input once the terminal line has been seen. Unrecognized lines are
/// skipped, as are statistic lines with malformed operands.
pub fn parse<I, S>(lines: I) -> Script
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut script = Script::default();

    for line in lines {
        let line = line.as_ref().trim();
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            ["TEMPERATURE", "AIR", operands @ ..] => {
                push_parsed(&mut script.temperature, line, temperature_query(operands))
            }
            ["TEMPERATURE", "FEELS", operands @ ..] => {
                push_parsed(&mut script.feels_like, line, temperature_query(operands))
            }
            ["HUMIDITY", operands @ ..] => {
                push_parsed(&mut script.humidity, line, window(operands))
            }
            ["WIND", operands @ ..] => push_parsed(&mut script.wind, line, window(operands)),
            ["PRECIPITATION", operands @ ..] => {
                push_parsed(&mut script.precipitation, line, window(operands))
            }
            _ => match immediate(line) {
                Some(directive) => {
                    let terminal = matches!(directive, Directive::Reverse(_));
                    script.immediate.push(directive);
                    if terminal {
                        break;
                    }
                }
                None if !line.is_empty() => tracing::debug!(line, "ignoring unrecognized line"),
                None => {}
            },
        }
    }

    script
}

/// Resolution directives split on single spaces so that path and query
/// operands keep their inner spacing.
fn immediate(line: &str) -> Option<Directive> {
    let mut parts = line.splitn(3, ' ');
    let verb = parts.next().unwrap_or_default();
    let noun = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().to_string();

    let directive = match (verb, noun) {
        ("TARGET", "FILE") => Directive::Target(Source::File(rest)),
        ("TARGET", "NOMINATIM") => Directive::Target(Source::Live(rest)),
        ("WEATHER", "FILE") => Directive::Weather(Source::File(rest)),
        ("WEATHER", "NWS") => Directive::Weather(Source::Live(rest)),
        ("REVERSE", "FILE") => Directive::Reverse(Source::File(rest)),
        ("REVERSE", "NOMINATIM") => Directive::Reverse(Source::Live(rest)),
        _ => return None,
    };
    Some(directive)
}

fn push_parsed<T>(queue: &mut Vec<T>, line: &str, parsed: Option<T>) {
    match parsed {
        Some(item) => queue.push(item),
        None => tracing::warn!(line, "ignoring statistic with malformed operands"),
    }
}

fn temperature_query(tokens: &[&str]) -> Option<TemperatureQuery> {
    match tokens {
        [scale, hours, extremum] => Some(TemperatureQuery {
            scale: Scale::parse(scale)?,
            window: Window { hours: hours.parse().ok()?, extremum: Extremum::parse(extremum)? },
        }),
        _ => None,
    }
}

fn window(tokens: &[&str]) -> Option<Window> {
    match tokens {
        [hours, extremum] => {
            Some(Window { hours: hours.parse().ok()?, extremum: Extremum::parse(extremum)? })
        }
        _ => None,
    }
}
