//! `dateformat`-style masks (`yyyy-mm-dd`, `HH:MM:ss`) rendered with chrono.
//!
//! Lowercase `m` is the month and uppercase `M` the minute, as in the
//! dateformat library used by Gruntfile banners. Text inside single or
//! double quotes is copied verbatim.

use chrono::{DateTime, Datelike, TimeZone, Timelike};

/// Render `date` according to `mask`.
pub fn format<Tz: TimeZone>(date: &DateTime<Tz>, mask: &str) -> String
where
  Tz::Offset: std::fmt::Display,
{
  let mut out = String::new();
  let chars: Vec<char> = mask.chars().collect();
  let mut i = 0;

  while i < chars.len() {
    let c = chars[i];

    if c == '\'' || c == '"' {
      let end = chars[i + 1..].iter().position(|&q| q == c).map(|p| i + 1 + p);
      match end {
        Some(end) => {
          out.extend(&chars[i + 1..end]);
          i = end + 1;
        }
        None => {
          out.extend(&chars[i + 1..]);
          i = chars.len();
        }
      }
      continue;
    }

    let run = chars[i..].iter().take_while(|&&r| r == c).count();
    let (token_len, rendered) = token(date, c, run);
    match rendered {
      Some(text) => out.push_str(&text),
      None => out.extend(std::iter::repeat_n(c, token_len)),
    }
    i += token_len;
  }

  out
}

/// Render the longest known token made of `run` repetitions of `c`.
///
/// Returns the number of characters consumed and the rendered text, or
/// `None` when `c` is not a mask character.
fn token<Tz: TimeZone>(date: &DateTime<Tz>, c: char, run: usize) -> (usize, Option<String>)
where
  Tz::Offset: std::fmt::Display,
{
  let hour12 = match date.hour() % 12 {
    0 => 12,
    h => h,
  };

  match c {
    'y' if run >= 4 => (4, Some(format!("{:04}", date.year()))),
    'y' if run >= 2 => (2, Some(format!("{:02}", date.year().rem_euclid(100)))),
    'm' => match run.min(4) {
      4 => (4, Some(date.format("%B").to_string())),
      3 => (3, Some(date.format("%b").to_string())),
      2 => (2, Some(format!("{:02}", date.month()))),
      _ => (1, Some(date.month().to_string())),
    },
    'd' => match run.min(4) {
      4 => (4, Some(date.format("%A").to_string())),
      3 => (3, Some(date.format("%a").to_string())),
      2 => (2, Some(format!("{:02}", date.day()))),
      _ => (1, Some(date.day().to_string())),
    },
    'H' => two_or_one(run, date.hour()),
    'h' => two_or_one(run, hour12),
    'M' => two_or_one(run, date.minute()),
    's' => two_or_one(run, date.second()),
    'T' if run >= 2 => (2, Some(if date.hour() < 12 { "AM" } else { "PM" }.to_string())),
    't' if run >= 2 => (2, Some(if date.hour() < 12 { "am" } else { "pm" }.to_string())),
    _ => (run, None),
  }
}

fn two_or_one(run: usize, value: u32) -> (usize, Option<String>) {
  if run >= 2 {
    (2, Some(format!("{value:02}")))
  } else {
    (1, Some(value.to_string()))
  }
}
