//! Read-only HTML status page served by the sensor node.
//!
//! Renders a complete HTTP/1.1 response: who has done how many cycles
//! (in duty order, next-up first), the total, next-up and last cleaner.

use core::fmt::Write as _;

use crate::ledger::DutyLedger;
use crate::protocol::NO_NAME;

const STYLE: &str = "\
body{font-family:system-ui;background:#020617;color:#e5e7eb;display:flex;justify-content:center;padding:24px}\
.card{background:#020617;border-radius:16px;border:1px solid #1f2937;padding:20px 24px;max-width:460px;width:100%}\
h1{margin-top:0;font-size:20px}\
table{width:100%;border-collapse:collapse;margin-top:8px;margin-bottom:12px}\
th,td{text-align:left;padding:4px 0;border-bottom:1px solid #111827}\
th{color:#9ca3af;font-weight:500}\
.total,.meta{font-size:13px;color:#9ca3af;margin-top:6px}";

/// Escape text for an HTML text node.
fn escape(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

/// HTML body only.
pub fn render_body(ledger: &DutyLedger, last_cleaner: Option<&str>) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>DishDuty Sensor</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<div class=\"card\">\n");
    html.push_str("<h1>DishDuty &middot; Sensor Node</h1>\n");
    html.push_str(
        "<p class=\"meta\">Tracks completed dish cycles with soap usage verification.</p>\n",
    );
    html.push_str("<table>\n<tr><th>Name</th><th>Dishes done</th></tr>\n");
    for name in ledger.ordered() {
        html.push_str("<tr><td>");
        escape(&mut html, name);
        let _ = writeln!(html, "</td><td>{}</td></tr>", ledger.count(name));
    }
    html.push_str("</table>\n");
    let _ = writeln!(
        html,
        "<div class=\"total\">Total: <strong>{}</strong></div>",
        ledger.total()
    );
    html.push_str("<div class=\"meta\">Next up: <strong>");
    escape(&mut html, ledger.next_up().unwrap_or(NO_NAME));
    html.push_str("</strong><br/>Last: <strong>");
    escape(&mut html, last_cleaner.unwrap_or(NO_NAME));
    html.push_str("</strong></div>\n</div>\n</body>\n</html>\n");
    html
}

/// Full `200 OK` response, headers included.
pub fn render(ledger: &DutyLedger, last_cleaner: Option<&str>) -> String {
    let body = render_body(ledger, last_cleaner);
    let mut resp = String::with_capacity(body.len() + 128);
    let _ = write!(
        resp,
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    resp.push_str(&body);
    resp
}
