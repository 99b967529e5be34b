use std::io::{Read, Write};

use crate::core::{
    Cell, ForecastError, ForecastRecord, KeywordRecord, RawKeywordRow, Result, coerce_rows,
};

pub const EXPORT_HEADERS: [&str; 10] = [
    "Scenario",
    "Project",
    "Keyword",
    "Month",
    "Date",
    "Position",
    "CTR",
    "Raw Clicks",
    "Forecast Clicks",
    "Current URL",
];

pub fn read_keywords_csv<R: Read>(source: R) -> Result<Vec<KeywordRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(name))
    };
    let required =
        |name: &str| column(name).ok_or_else(|| ForecastError::MissingColumn(name.to_string()));

    let project_col = required("Project")?;
    let keyword_col = required("Keyword")?;
    let msv_col = column("MSV");
    let position_col = column("Current Position");
    let aio_col = column("AI Overview");
    let fs_col = column("Featured Snippet");
    let url_col = column("Current URL");

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let text = |col: Option<usize>| col.and_then(|idx| record.get(idx)).map(str::to_string);
        let cell = |col: Option<usize>| text(col).map(Cell::Text);
        rows.push(RawKeywordRow {
            project: text(Some(project_col)),
            keyword: text(Some(keyword_col)),
            msv: cell(msv_col),
            current_position: cell(position_col),
            ai_overview: cell(aio_col),
            featured_snippet: cell(fs_col),
            current_url: text(url_col),
        });
    }
    Ok(coerce_rows(rows))
}

pub fn write_forecast_csv<W: Write>(records: &[ForecastRecord], sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(EXPORT_HEADERS)?;
    for record in records {
        writer.write_record([
            record.scenario.label().to_string(),
            record.project.clone(),
            record.keyword.clone(),
            record.calendar_date.format("%b %Y").to_string(),
            record.calendar_date.to_string(),
            record.display_position().to_string(),
            record.ctr_percent.to_string(),
            record.raw_clicks.to_string(),
            record.adjusted_clicks.to_string(),
            record.url.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScenarioKind;
    use chrono::NaiveDate;

    const SHEET: &str = "\
Project,Keyword,MSV,Current Position,AI Overview,Featured Snippet,Current URL
Acme,shoes,12100,8,No,No,https://acme.test/shoes
Acme,boots,n/a,,yes,YES,
,orphan,50,3,No,No,
Globex,hats,300,42,No,Yes,https://globex.test/hats
";

    #[test]
    fn reads_and_coerces_keyword_sheet() {
        let records = read_keywords_csv(SHEET.as_bytes()).expect("valid sheet");
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].project, "Acme");
        assert_eq!(records[0].msv, 12_100.0);
        assert_eq!(records[0].current_position, 8.0);
        assert_eq!(records[0].current_url.as_deref(), Some("https://acme.test/shoes"));

        assert_eq!(records[1].msv, 0.0);
        assert_eq!(records[1].current_position, 0.0);
        assert!(records[1].has_ai_overview);
        assert!(records[1].has_featured_snippet);
        assert_eq!(records[1].current_url, None);

        assert_eq!(records[2].keyword, "hats");
    }

    #[test]
    fn header_lookup_ignores_case_and_optional_columns() {
        let sheet = "project , KEYWORD\nAcme,shoes\n";
        let records = read_keywords_csv(sheet.as_bytes()).expect("valid sheet");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].msv, 0.0);
        assert!(!records[0].has_ai_overview);
    }

    #[test]
    fn missing_keyword_column_is_rejected() {
        let err =
            read_keywords_csv("Project,MSV\nAcme,10\n".as_bytes()).expect_err("missing column");
        assert!(matches!(err, ForecastError::MissingColumn(ref c) if c == "Keyword"));
    }

    #[test]
    fn export_writes_header_and_rounded_positions() {
        let record = ForecastRecord {
            scenario: ScenarioKind::Medium,
            project: "Acme".to_string(),
            keyword: "shoes".to_string(),
            url: "https://acme.test/shoes".to_string(),
            month_index: 2,
            calendar_date: NaiveDate::from_ymd_opt(2026, 11, 1).expect("valid date"),
            position: 7.5,
            ctr_percent: 4.0,
            raw_clicks: 484.0,
            adjusted_clicks: 484.0,
            live: true,
        };
        let mut out = Vec::new();
        write_forecast_csv(&[record], &mut out).expect("export");
        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "Scenario,Project,Keyword,Month,Date,Position,CTR,Raw Clicks,Forecast Clicks,\
                 Current URL"
            )
        );
        assert_eq!(
            lines.next(),
            Some("Medium,Acme,shoes,Nov 2026,2026-11-01,8,4,484,484,https://acme.test/shoes")
        );
        assert_eq!(lines.next(), None);
    }
}
