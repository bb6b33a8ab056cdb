//! Reads `.xlsx`/`.xlsm` workbooks into value grids.
//!
//! The reader walks the zip container directly with quick-xml: workbook
//! relationships and sheet list first, then styles (to recognize date/time
//! cells), shared strings, and finally each accepted worksheet's cells.

use crate::error::SheetMergeError;
use crate::grid::reference::reference_to_index;
use crate::grid::SheetGrid;
use crate::grid::Value;
use crate::match_xml_events;
use crate::workbook::filter::SheetFilter;
use crate::workbook::xml::XmlNodeHelper;
use crate::workbook::xml::XmlReader;
use crate::workbook::xml::XmlTextHelper;
use crate::workbook::WorkbookError;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

// XML tag names for the parts of the XLSX format the reader touches
const TAG_RELATIONSHIP: &[u8] = b"Relationship"; // Workbook relationship entry
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt"); // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs"); // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf"); // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si"); // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh"); // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t"); // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet"); // Worksheet definition
const TAG_ROW: QName = QName(b"row"); // Row in worksheet
const TAG_CELL: QName = QName(b"c"); // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is"); // Inline string value
const TAG_VALUE: QName = QName(b"v"); // Cell value content

/// Buffered local file reader backing the zip archive
pub(crate) type FileReader = BufReader<File>;

/// How a numeric cell's value should be interpreted, derived from the
/// cell's number format.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
enum NumberFormat {
    #[default]
    General,
    Date,
    Time,
    DateTime,
}

impl NumberFormat {
    /// Maps built-in Excel number format IDs to an interpretation.
    fn from_builtin_id(id: &str) -> Option<Self> {
        match id {
            "22" => Some(Self::DateTime),
            "14" | "15" | "16" | "17" => Some(Self::Date),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::Time),
            _ => None,
        }
    }

    /// Classifies a custom number format string by scanning its format
    /// codes for date/time characters, skipping escapes, string literals
    /// and color sections.
    fn from_format_code(format: &str) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::DateTime,
            (true, false) => Self::Date,
            (false, true) => Self::Time,
            (false, false) => Self::General,
        }
    }
}

/// Interpretation of one cell while its events stream past.
#[derive(Clone, Debug, Default, PartialEq)]
enum RawKind {
    /// Cell outside the requested region, or an error cell (read as blank)
    #[default]
    Skip,
    Boolean,
    Number(NumberFormat),
    SharedString,
    InlineString,
    IsoDateTime,
}

/// One worksheet entry from the workbook part.
#[derive(Clone, Debug)]
struct SheetEntry {
    name: String,
    path: String,
    visible: bool,
}

/// An open `.xlsx`/`.xlsm` workbook.
#[derive(Debug)]
pub(crate) struct XlsxWorkbook {
    zip: ZipArchive<FileReader>,
    shared_strings: Vec<String>,
    number_formats: Vec<NumberFormat>,
    is_1904: bool,
    sheets: Vec<SheetEntry>,
}

impl XlsxWorkbook {
    /// Opens a workbook file and parses its structural parts.
    pub(crate) fn open(path: &Path) -> Result<XlsxWorkbook, SheetMergeError> {
        let file = File::open(path)?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;
        let relationships = load_relationships(&mut zip)?;
        let (sheets, is_1904) = load_workbook(&mut zip, &relationships)?;
        if sheets.is_empty() {
            Err(WorkbookError::EmptyWorkbook(
                path.to_string_lossy().to_string(),
            ))?;
        }
        let number_formats = load_number_formats(&mut zip)?;
        let shared_strings = load_shared_strings(&mut zip)?;
        Ok(XlsxWorkbook {
            zip,
            shared_strings,
            number_formats,
            is_1904,
            sheets,
        })
    }

    /// Names of all sheets in workbook order, hidden ones included.
    pub(crate) fn sheet_names(&self) -> Vec<String> {
        self.sheets
            .iter()
            .map(|entry| entry.name.to_owned())
            .collect()
    }

    /// Reads every sheet accepted by the filter into a grid.
    pub(crate) fn read_sheets(
        &mut self,
        filter: &SheetFilter,
    ) -> Result<Vec<SheetGrid>, SheetMergeError> {
        let mut grids = Vec::new();
        for entry in &self.sheets {
            if filter
                .sheet_limit
                .map(|limit| grids.len() >= limit)
                .unwrap_or(false)
            {
                break;
            }
            if !filter.accept(&entry.name, entry.visible) {
                tracing::debug!(sheet = entry.name, "sheet filtered out");
                continue;
            }
            let grid = read_sheet(
                &mut self.zip,
                entry,
                filter,
                &self.shared_strings,
                &self.number_formats,
                self.is_1904,
            )?;
            grids.push(grid);
        }
        Ok(grids)
    }
}

/// Reads one worksheet part into a grid, applying the filter's region.
fn read_sheet(
    zip: &mut ZipArchive<FileReader>,
    entry: &SheetEntry,
    filter: &SheetFilter,
    shared_strings: &[String],
    number_formats: &[NumberFormat],
    is_1904: bool,
) -> Result<SheetGrid, SheetMergeError> {
    let mut grid = SheetGrid::new(&entry.name);
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = RawKind::default();
    let mut value = String::new();
    let mut reader = xml_part(zip, &entry.path)?
        .ok_or_else(|| WorkbookError::MissingPart(entry.path.to_owned()))?;
    match_xml_events!(reader => {
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
            col_count = 0;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count += 1;
            value.clear();
            if filter.region.map(|region| region.after_last_row(row)).unwrap_or(false) {
                break;
            }
            if filter.region.map(|region| region.contains(row, col)).unwrap_or(true) {
                let mut format = NumberFormat::General;
                if let Some(style) = event.get_attribute_value("s")? {
                    if !style.is_empty() {
                        let index = style.parse::<usize>()?;
                        format = number_formats.get(index).copied().unwrap_or_default();
                    }
                }
                kind = match event.get_attribute_value("t")?.as_deref() {
                    Some("inlineStr") | Some("str") => RawKind::InlineString,
                    Some("s") => RawKind::SharedString,
                    Some("b") => RawKind::Boolean,
                    Some("d") => RawKind::IsoDateTime,
                    Some("e") => RawKind::Skip, // error cells read as blanks
                    _ => RawKind::Number(format),
                };
            } else {
                kind = RawKind::Skip;
            }
        }
        Event::Start(event) if kind != RawKind::Skip && event.name() == TAG_INLINE_STRING => {
            value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if kind != RawKind::Skip && event.name() == TAG_VALUE => {
            value = read_string_value(&mut reader, TAG_VALUE, true)?;
        }
        Event::End(event) if kind != RawKind::Skip && !value.is_empty() && event.name() == TAG_CELL => {
            let cell = convert_cell(&kind, &value, shared_strings, is_1904)?;
            grid.set(row, col, cell);
            value.clear();
        }
    });
    Ok(grid)
}

/// Converts a raw cell payload into a typed value.
fn convert_cell(
    kind: &RawKind,
    value: &str,
    shared_strings: &[String],
    is_1904: bool,
) -> Result<Value, SheetMergeError> {
    let cell = match kind {
        RawKind::Skip => Value::Empty,
        RawKind::Boolean => Value::Bool(value == "1"),
        RawKind::InlineString => Value::Text(value.to_owned()),
        RawKind::SharedString => {
            let index = value.parse::<usize>()?;
            Value::Text(
                shared_strings
                    .get(index)
                    .cloned()
                    .unwrap_or_default(),
            )
        }
        RawKind::IsoDateTime => {
            if value.contains('T') {
                let datetime =
                    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")?;
                Value::DateTime(datetime)
            } else {
                Value::Date(NaiveDate::parse_from_str(value, "%Y-%m-%d")?)
            }
        }
        RawKind::Number(format) => {
            let number = value.parse::<f64>()?;
            match format {
                NumberFormat::General => Value::Number(number),
                NumberFormat::Date => serial_to_date(number, is_1904)
                    .map(Value::Date)
                    .unwrap_or(Value::Number(number)),
                NumberFormat::Time => serial_to_time(number)
                    .map(Value::Time)
                    .unwrap_or(Value::Number(number)),
                NumberFormat::DateTime => serial_to_datetime(number, is_1904)
                    .map(Value::DateTime)
                    .unwrap_or(Value::Number(number)),
            }
        }
    };
    Ok(cell)
}

/// Converts an Excel serial number to a date.
/// Serials below 60 carry the Lotus 1-2-3 leap-year artifact in the 1900
/// system; the 1904 system is offset by 1462 days.
fn serial_to_date(serial: f64, is_1904: bool) -> Option<NaiveDate> {
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(days + offset))
}

/// Converts the fractional part of an Excel serial number to a time of day.
fn serial_to_time(serial: f64) -> Option<NaiveTime> {
    let milliseconds = ((serial.fract() * 86_400_000f64).round() as i64).rem_euclid(86_400_000);
    NaiveTime::from_num_seconds_from_midnight_opt(
        (milliseconds / 1_000) as u32,
        ((milliseconds % 1_000) as u32) * 1_000_000,
    )
}

/// Converts an Excel serial number to a full timestamp.
fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    Some(serial_to_date(serial, is_1904)?.and_time(serial_to_time(serial)?))
}

/// Loads worksheet relationships: relationship IDs to worksheet zip paths.
fn load_relationships(
    zip: &mut ZipArchive<FileReader>,
) -> Result<HashMap<String, String>, SheetMergeError> {
    let path = "xl/_rels/workbook.xml.rels";
    let mut reader =
        xml_part(zip, path)?.ok_or_else(|| WorkbookError::MissingPart(path.to_owned()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only worksheet relationships matter here
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Loads the sheet list (name, worksheet path, visibility) and the date
/// system flag from the workbook part.
fn load_workbook(
    zip: &mut ZipArchive<FileReader>,
    relationships: &HashMap<String, String>,
) -> Result<(Vec<SheetEntry>, bool), SheetMergeError> {
    let path = "xl/workbook.xml";
    let mut reader =
        xml_part(zip, path)?.ok_or_else(|| WorkbookError::MissingPart(path.to_owned()))?;
    let mut sheets: Vec<SheetEntry> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            let mut visible = true;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"state" {
                    let state = attribute.unescape_value()?;
                    visible = state != "hidden" && state != "veryHidden";
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id.to_string()) {
                    sheets.push(SheetEntry {
                        name: name.to_string(),
                        path: path.to_owned(),
                        visible,
                    });
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads number formats from the styles part and resolves each cell format
/// index to an interpretation.
fn load_number_formats(
    zip: &mut ZipArchive<FileReader>,
) -> Result<Vec<NumberFormat>, SheetMergeError> {
    let mut reader = match xml_part(zip, "xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, NumberFormat>::new();

    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if !custom_formats_context && event.name() == TAG_CUSTOM_FORMATS => {
            custom_formats_context = true;
        }
        Event::End(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMATS => {
            custom_formats_context = false;
        }
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), NumberFormat::from_format_code(&format));
            }
        }

        Event::Start(event) if !format_indexes_context && event.name() == TAG_FORMAT_INDEXES => {
            format_indexes_context = true;
        }
        Event::End(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEXES => {
            format_indexes_context = false;
        }
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            if let Some(id) = event.get_attribute_value("numFmtId")? {
                format_indexes.push(id.to_string());
            }
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| NumberFormat::from_builtin_id(id))
                .unwrap_or_default()
        })
        .collect())
}

/// Loads the shared string table, in order.
fn load_shared_strings(
    zip: &mut ZipArchive<FileReader>,
) -> Result<Vec<String>, SheetMergeError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match xml_part(zip, "xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Reads string content up to the closing tag, skipping phonetic
/// annotations and resolving entity references.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, SheetMergeError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

/// Gets an XML reader for a file within the archive, matching the path
/// case-insensitively. `None` when the part does not exist.
fn xml_part<'a, RS: Read + Seek>(
    zip: &'a mut ZipArchive<RS>,
    name: &str,
) -> Result<Option<XmlReader<BufReader<ZipFile<'a, RS>>>>, SheetMergeError> {
    let pattern = name.replace('\\', "/");
    let path = zip
        .file_names()
        .find(|file_name| pattern.eq_ignore_ascii_case(file_name))
        .map(|file_name| file_name.to_owned());
    match path.map(|file_name| zip.by_name(&file_name)).transpose() {
        Ok(Some(file)) => Ok(Some(XmlReader::new(BufReader::new(file)))),
        Ok(None) | Err(ZipError::FileNotFound) => Ok(None),
        Err(error) => Err(error)?,
    }
}

/// Normalizes a relationship target into a zip path under `xl/`.
fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(stripped) = path.strip_prefix("/xl/") {
        format!("xl/{stripped}")
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}
