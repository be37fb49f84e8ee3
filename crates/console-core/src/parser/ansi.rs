/// ANSI escape sequence scanning and SGR interpretation
///
/// Deployment logs carry the colored output of whatever tool ran the stage.
/// Only CSI sequences (`ESC [ … final`) are recognized; an ESC that does not
/// start a complete CSI on the same line is kept as literal text.

use std::borrow::Cow;

use super::model::{Color, Style};

pub(crate) const ESC: char = '\x1b';

/// A complete CSI sequence borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Csi<'a> {
    pub params: &'a str,
    pub intermediates: &'a str,
    pub final_byte: u8,
}

/// What a recognized sequence did to the style accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgrOutcome {
    /// Well-formed SGR; codes were interpreted (unknown codes are skipped).
    Applied,
    /// Not an SGR, or malformed parameters. State untouched.
    Ignored,
}

/// Scan a CSI at the start of `input` (which must begin with ESC).
///
/// Returns the sequence and its length in bytes, or `None` when the bytes
/// after ESC do not form a terminated CSI.
pub(crate) fn scan_csi(input: &str) -> Option<(Csi<'_>, usize)> {
    let bytes = input.as_bytes();
    if bytes.len() < 2 || bytes[0] != 0x1b || bytes[1] != b'[' {
        return None;
    }

    let params_start = 2;
    let mut i = params_start;
    while i < bytes.len() && (0x30..=0x3F).contains(&bytes[i]) {
        i += 1;
    }
    let params_end = i;
    while i < bytes.len() && (0x20..=0x2F).contains(&bytes[i]) {
        i += 1;
    }
    let intermediates_end = i;

    match bytes.get(i) {
        Some(&b) if (0x40..=0x7E).contains(&b) => Some((
            Csi {
                params: &input[params_start..params_end],
                intermediates: &input[params_end..intermediates_end],
                final_byte: b,
            },
            i + 1,
        )),
        _ => None,
    }
}

/// Apply one sequence to `style`.
///
/// The whole parameter list is validated before any code takes effect, so a
/// malformed sequence never leaves the style half-updated.
pub(crate) fn apply_sequence(style: &mut Style, csi: &Csi<'_>) -> SgrOutcome {
    if csi.final_byte != b'm' || !csi.intermediates.is_empty() {
        return SgrOutcome::Ignored;
    }
    let Some(codes) = sgr_codes(csi.params) else {
        return SgrOutcome::Ignored;
    };

    let mut next = *style;
    let mut i = 0;
    while i < codes.len() {
        match codes[i] {
            0 => next = Style::default(),
            1 => match codes.get(i + 1).copied() {
                // `1;3x` selects the bright palette
                Some(c @ 30..=37) => {
                    next.bold = true;
                    next.foreground = Color::bright(c - 30);
                    i += 1;
                }
                _ => next.bold = true,
            },
            4 => next.underline = true,
            7 => next.reversed = true,
            c @ 30..=37 => next.foreground = Color::standard(c - 30),
            c @ 40..=47 => next.background = Color::standard(c - 40),
            _ => {}
        }
        i += 1;
    }

    *style = next;
    SgrOutcome::Applied
}

/// Empty parameters count as `0`; anything but plain decimal digits
/// (sub-parameters, private markers, overflow) rejects the sequence.
fn sgr_codes(params: &str) -> Option<Vec<u16>> {
    params
        .split(';')
        .map(|p| {
            if p.is_empty() {
                Some(0)
            } else if p.bytes().all(|b| b.is_ascii_digit()) {
                p.parse().ok()
            } else {
                None
            }
        })
        .collect()
}

/// Strip every recognized escape sequence from `input`.
///
/// Returns Cow::Borrowed if there is no ESC at all (zero allocation).
/// Unterminated sequences are kept verbatim, matching what the renderer
/// shows as literal text.
pub fn strip_ansi_codes(input: &str) -> Cow<'_, str> {
    if !input.contains(ESC) {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find(ESC) {
        output.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match scan_csi(tail) {
            Some((_, len)) => rest = &tail[len..],
            None => {
                output.push(ESC);
                rest = &tail[ESC.len_utf8()..];
            }
        }
    }
    output.push_str(rest);

    Cow::Owned(output)
}
