//! The build-server summary: an XML table of per-module coverage, suitable
//! for a build pipeline's summary display.
//!
//! Every cell of a module that is below 100% for any checked kind is flagged
//! red, so gaps are visible at a glance on the dashboard.

use std::io;

use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::{coverage::CoverageReport, domain::LinkKind};

const fn kind_header(kind: LinkKind) -> &'static str {
    match kind {
        LinkKind::Source => "Source Links (%)",
        LinkKind::Test => "Test Links (%)",
    }
}

/// Writes the summary table as indented XML.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn write_summary<W: io::Write>(out: W, report: &CoverageReport) -> io::Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer.write_event(Event::Start(BytesStart::new("root")))?;
    writer.write_event(Event::Start(BytesStart::new("table")))?;

    writer.write_event(Event::Start(BytesStart::new("tr")))?;
    header_cell(&mut writer, "Module Name")?;
    header_cell(&mut writer, "# Reqs")?;
    for &kind in report.kinds() {
        header_cell(&mut writer, kind_header(kind))?;
    }
    writer.write_event(Event::End(BytesEnd::new("tr")))?;

    for (name, stats) in report.modules() {
        let flagged = report.kinds().iter().any(|&kind| !stats.is_complete(kind));

        writer.write_event(Event::Start(BytesStart::new("tr")))?;
        cell(&mut writer, name, true, flagged)?;
        cell(&mut writer, &stats.requirements().to_string(), false, flagged)?;
        for &kind in report.kinds() {
            cell(
                &mut writer,
                &format!("{:.2}", stats.percent(kind)),
                false,
                flagged,
            )?;
        }
        writer.write_event(Event::End(BytesEnd::new("tr")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("table")))?;
    writer.write_event(Event::End(BytesEnd::new("root")))?;
    Ok(())
}

fn header_cell<W: io::Write>(writer: &mut Writer<W>, text: &str) -> io::Result<()> {
    cell(writer, text, true, false)
}

fn cell<W: io::Write>(
    writer: &mut Writer<W>,
    text: &str,
    bold: bool,
    flagged: bool,
) -> io::Result<()> {
    let mut td = BytesStart::new("td");
    if bold {
        td.push_attribute(("fontattribute", "bold"));
    }
    td.push_attribute(("align", "center"));
    if flagged {
        td.push_attribute(("bgcolor", "red"));
    }

    writer.write_event(Event::Start(td))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("td")))?;
    Ok(())
}
