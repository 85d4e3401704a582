// AT response line handling - separates wire-level line framing from the
// command state machine.
//
// This module provides the line scanner that turns the modem's byte stream
// into logical lines (including the newline-less SMS prompt), the
// command-identifier extraction used to recognise info lines, and the
// classifier that assigns every received line to exactly one kind.

use bytes::{Buf, BytesMut};

use crate::client::Error;

/// The escape byte used to abort an in-flight SMS or partial command.
pub(crate) const ESC: u8 = 0x1B;

/// The Ctrl-Z byte terminating an SMS payload.
pub(crate) const CTRL_Z: char = '\u{1A}';

/// Kind of a line received from the modem, relative to the active command.
///
/// Every non-empty line falls into exactly one kind. Lines that are not
/// recognised (vendor chatter, echoed SMS PDUs) are `Unknown` and are kept
/// as info rather than dropped, so callers that understand them still see
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    /// The literal `OK` status.
    StatusOk,
    /// `ERROR`, `+CME ERROR: ...` or `+CMS ERROR: ...`.
    StatusError,
    /// Line prefixed with `<cmdID>:`.
    Info,
    /// The `>` prompt requesting an SMS payload.
    SmsPrompt,
    /// The modem echoing our own command line back.
    EchoCmdLine,
    /// `CONNECT ...` result of a dial command.
    Connect,
    /// `BUSY` / `NO ANSWER` / `NO CARRIER` / `NO DIALTONE` dial failure.
    ConnectError,
    /// Anything else, including SMS PDU echoes and vendor chatter.
    Unknown,
}

/// Returns the identifier component of a command.
///
/// This is the section prior to any `=` or `?` and is generally, but not
/// always, used by the modem to prefix info lines corresponding to the
/// command.
pub(crate) fn cmd_id(cmd: &str) -> &str {
    match cmd.find(['=', '?']) {
        Some(idx) => &cmd[..idx],
        None => cmd,
    }
}

/// Classifies a received line against the active command identifier.
///
/// Dial results (`CONNECT`, `BUSY`, ...) are only recognised for commands
/// whose identifier starts with `D`; for anything else a line such as
/// `NO SIGNAL` from vendor chatter must stay `Unknown`.
pub(crate) fn classify(line: &str, cmd_id: &str) -> Kind {
    if line == "OK" {
        return Kind::StatusOk;
    }
    if line.starts_with("ERROR")
        || line.starts_with("+CME ERROR:")
        || line.starts_with("+CMS ERROR:")
    {
        return Kind::StatusError;
    }
    if line
        .strip_prefix(cmd_id)
        .is_some_and(|rest| rest.starts_with(':'))
    {
        return Kind::Info;
    }
    if line == ">" {
        return Kind::SmsPrompt;
    }
    if line
        .strip_prefix("AT")
        .is_some_and(|rest| rest.starts_with(cmd_id))
    {
        return Kind::EchoCmdLine;
    }
    if !cmd_id.starts_with('D') {
        // Not a dial command, so no point parsing dial results.
        return Kind::Unknown;
    }
    if line.starts_with("CONNECT") {
        return Kind::Connect;
    }
    if matches!(line, "BUSY" | "NO ANSWER" | "NO CARRIER" | "NO DIALTONE") {
        return Kind::ConnectError;
    }
    Kind::Unknown
}

/// Maps a `StatusError` line to the corresponding error value.
///
/// The CME/CMS value is the trimmed text after the colon, which may be
/// numeric or textual depending on the modem configuration.
pub(crate) fn status_error(line: &str) -> Error {
    if let Some(value) = line.strip_prefix("+CMS ERROR:") {
        return Error::Cms(value.trim().to_string());
    }
    if let Some(value) = line.strip_prefix("+CME ERROR:") {
        return Error::Cme(value.trim().to_string());
    }
    Error::Error
}

/// Splits the next logical line off the front of `buf`.
///
/// Standard splitting is on `\n` with a single trailing `\r` dropped, with
/// one exception: a leading `>` is emitted immediately as a one-byte token
/// (advancing past any trailing spaces), because the modem sends the SMS
/// prompt without a newline and waiting for one would stall the driver.
///
/// Returns `None` when the buffer holds no complete token yet.
pub(crate) fn split_token(buf: &mut BytesMut) -> Option<String> {
    if buf.first() == Some(&b'>') {
        let mut end = 1;
        while buf.get(end) == Some(&b' ') {
            end += 1;
        }
        buf.advance(end);
        return Some(">".to_string());
    }
    let nl = buf.iter().position(|&b| b == b'\n')?;
    let raw = buf.split_to(nl + 1);
    Some(decode_line(&raw[..nl]))
}

/// Decodes the remaining bytes as a final token once the stream has ended.
pub(crate) fn split_final(buf: &mut BytesMut) -> Option<String> {
    if buf.is_empty() {
        return None;
    }
    let raw = buf.split();
    let line = decode_line(&raw);
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

fn decode_line(mut raw: &[u8]) -> String {
    if raw.last() == Some(&b'\r') {
        raw = &raw[..raw.len() - 1];
    }
    // Vendor chatter is not guaranteed to be UTF-8.
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(data: &[u8]) -> Vec<String> {
        let mut buf = BytesMut::from(data);
        let mut out = Vec::new();
        while let Some(t) = split_token(&mut buf) {
            out.push(t);
        }
        out.extend(split_final(&mut buf));
        out
    }

    #[test]
    fn cmd_id_strips_arguments() {
        assert_eq!(cmd_id("CMGS=42"), "CMGS");
        assert_eq!(cmd_id("CPIN?"), "CPIN");
        assert_eq!(cmd_id("+CMGF=1"), "+CMGF");
        assert_eq!(cmd_id("D12345;"), "D12345;");
        assert_eq!(cmd_id(""), "");
    }

    #[test]
    fn classify_status_lines() {
        assert_eq!(classify("OK", "CSQ"), Kind::StatusOk);
        assert_eq!(classify("ERROR", "CSQ"), Kind::StatusError);
        assert_eq!(classify("+CME ERROR: 11", "CSQ"), Kind::StatusError);
        assert_eq!(classify("+CMS ERROR: 305", "CMGS"), Kind::StatusError);
        // OK must match exactly.
        assert_eq!(classify("OKAY", "CSQ"), Kind::Unknown);
    }

    #[test]
    fn classify_info_and_echo() {
        assert_eq!(classify("+CSQ: 14,99", "+CSQ"), Kind::Info);
        assert_eq!(classify("+CSQX: 14,99", "+CSQ"), Kind::Unknown);
        assert_eq!(classify("AT+CSQ", "+CSQ"), Kind::EchoCmdLine);
        assert_eq!(classify("AT+CSQ=1", "+CSQ"), Kind::EchoCmdLine);
    }

    #[test]
    fn classify_prompt() {
        assert_eq!(classify(">", "+CMGS"), Kind::SmsPrompt);
        assert_eq!(classify("> ", "+CMGS"), Kind::Unknown);
    }

    #[test]
    fn classify_dial_results_gated_on_dial_commands() {
        assert_eq!(classify("CONNECT 57600", "D123"), Kind::Connect);
        assert_eq!(classify("BUSY", "D123"), Kind::ConnectError);
        assert_eq!(classify("NO CARRIER", "D123"), Kind::ConnectError);
        assert_eq!(classify("NO DIALTONE", "D123"), Kind::ConnectError);
        assert_eq!(classify("NO ANSWER", "D123"), Kind::ConnectError);
        // The same lines from a non-dial command are vendor chatter.
        assert_eq!(classify("CONNECT 57600", "+CSQ"), Kind::Unknown);
        assert_eq!(classify("BUSY", "+CSQ"), Kind::Unknown);
        assert_eq!(classify("NO CARRIER", ""), Kind::Unknown);
    }

    #[test]
    fn status_error_values_are_trimmed() {
        assert!(matches!(status_error("ERROR"), Error::Error));
        match status_error("+CMS ERROR: 204") {
            Error::Cms(v) => assert_eq!(v, "204"),
            e => panic!("unexpected error: {e:?}"),
        }
        match status_error("+CME ERROR: SIM busy") {
            Error::Cme(v) => assert_eq!(v, "SIM busy"),
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[test]
    fn split_plain_lines() {
        assert_eq!(tokens(b"OK\r\n"), vec!["OK"]);
        assert_eq!(tokens(b"\r\ninfo1\r\ninfo2\r\n"), vec!["", "info1", "info2"]);
        assert_eq!(tokens(b"no newline yet"), vec!["no newline yet"]);
    }

    #[test]
    fn split_prompt_without_newline() {
        assert_eq!(tokens(b"\n> "), vec!["", ">"]);
        assert_eq!(tokens(b">"), vec![">"]);
        assert_eq!(tokens(b"\r\n>  \r\nOK\r\n"), vec!["", ">", "", "OK"]);
    }

    #[test]
    fn split_waits_for_complete_line() {
        let mut buf = BytesMut::from(&b"partial"[..]);
        assert_eq!(split_token(&mut buf), None);
        buf.extend_from_slice(b" line\r\n");
        assert_eq!(split_token(&mut buf).as_deref(), Some("partial line"));
        assert_eq!(split_token(&mut buf), None);
    }

    #[test]
    fn split_keeps_interior_cr() {
        assert_eq!(tokens(b"a\rb\r\n"), vec!["a\rb"]);
    }
}
