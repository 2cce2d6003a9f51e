use crate::model::{Itinerary, LegView};
use crate::normalizer::UNKNOWN_CARRIER;
use anyhow::{Result, anyhow};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub enum Writer {
    Table {
        out: Box<dyn Write>,
        currency: String,
    },
    Json {
        out: Box<dyn Write>,
        first: bool, // tracks if we've written the opening bracket
    },
    Jsonl(Box<dyn Write>),
    Csv {
        out: Box<dyn Write>,
        headers_written: bool,
    },
    Tsv {
        out: Box<dyn Write>,
        headers_written: bool,
    },
}

const COLUMNS: [&str; 15] = [
    "carrier",
    "flight",
    "price",
    "out_depart",
    "out_from",
    "out_arrive",
    "out_to",
    "out_stops",
    "out_duration_min",
    "ret_depart",
    "ret_from",
    "ret_arrive",
    "ret_to",
    "ret_stops",
    "ret_duration_min",
];

impl Writer {
    pub fn write_batch(&mut self, itineraries: &[Itinerary]) -> Result<()> {
        match self {
            Writer::Table { out, currency } => {
                for it in itineraries {
                    write!(out, "{}", table_entry(it, currency))?;
                }
            }
            Writer::Json { out, first } => {
                if *first {
                    write!(out, "[")?;
                    *first = false;
                } else {
                    write!(out, ",")?;
                }
                for (i, it) in itineraries.iter().enumerate() {
                    if i > 0 {
                        write!(out, ",")?;
                    }
                    let serialized = serde_json::to_string_pretty(it)?;
                    write!(out, "\n{}", serialized)?;
                }
            }
            Writer::Jsonl(out) => {
                for it in itineraries {
                    let serialized = serde_json::to_string(it)?;
                    writeln!(out, "{}", serialized)?;
                }
            }
            Writer::Csv {
                out,
                headers_written,
            } => {
                if !*headers_written {
                    writeln!(out, "{}", COLUMNS.join(","))?;
                    *headers_written = true;
                }
                for it in itineraries {
                    let row: Vec<String> =
                        fields(it).iter().map(|f| escape_csv_field(f)).collect();
                    writeln!(out, "{}", row.join(","))?;
                }
            }
            Writer::Tsv {
                out,
                headers_written,
            } => {
                if !*headers_written {
                    writeln!(out, "{}", COLUMNS.join("\t"))?;
                    *headers_written = true;
                }
                for it in itineraries {
                    let row: Vec<String> =
                        fields(it).iter().map(|f| escape_tsv_field(f)).collect();
                    writeln!(out, "{}", row.join("\t"))?;
                }
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        match self {
            Writer::Json {
                ref mut out,
                ref first,
            } => {
                if *first {
                    write!(out, "[")?;
                }
                writeln!(out, "\n]")?;
                out.flush()?;
            }
            Writer::Table { ref mut out, .. } => out.flush()?,
            Writer::Jsonl(ref mut out) => out.flush()?,
            Writer::Csv { ref mut out, .. } | Writer::Tsv { ref mut out, .. } => out.flush()?,
        }
        Ok(())
    }
}

pub fn create_writer(output_arg: &str, currency: &str) -> Result<Writer> {
    match output_arg {
        "stdout" | "table" => Ok(Writer::Table {
            out: Box::new(io::stdout()),
            currency: currency.to_string(),
        }),
        "json" => Ok(Writer::Json {
            out: Box::new(io::stdout()),
            first: true,
        }),
        "jsonl" => Ok(Writer::Jsonl(Box::new(io::stdout()))),
        path if path.ends_with(".json") => Ok(Writer::Json {
            out: file_writer(path)?,
            first: true,
        }),
        path if path.ends_with(".jsonl") || path.ends_with(".ndjson") => {
            Ok(Writer::Jsonl(file_writer(path)?))
        }
        path if path.ends_with(".csv") => Ok(Writer::Csv {
            out: file_writer(path)?,
            headers_written: false,
        }),
        path if path.ends_with(".tsv") => Ok(Writer::Tsv {
            out: file_writer(path)?,
            headers_written: false,
        }),
        path => {
            // Default to JSON file if it looks like a path
            if path.contains('/') || path.contains('\\') || path.contains('.') {
                Ok(Writer::Json {
                    out: file_writer(path)?,
                    first: true,
                })
            } else {
                Err(anyhow!(
                    "Unknown output format: {}. Use 'stdout', 'json', 'jsonl', or a file path",
                    output_arg
                ))
            }
        }
    }
}

fn file_writer(path: &str) -> Result<Box<dyn Write>> {
    create_parent_dirs(path)?;
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

fn create_parent_dirs(file_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(file_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn table_entry(it: &Itinerary, currency: &str) -> String {
    let mut header = it
        .carrier_name
        .as_deref()
        .unwrap_or(UNKNOWN_CARRIER)
        .to_string();
    if let Some(label) = &it.flight_label {
        header.push_str(" · ");
        header.push_str(label);
    }
    let price = match it.price {
        Some(p) => format!("{currency} {p:.2}"),
        None => "—".to_string(),
    };
    let mut entry = format!("{header:<46} {price:>14}\n");
    entry.push_str(&leg_row(&it.outbound));
    if let Some(ret) = &it.return_leg {
        entry.push_str(&leg_row(ret));
    }
    entry.push('\n');
    entry
}

fn leg_row(leg: &LegView) -> String {
    let stops = match leg.stop_count {
        0 => "Direct".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{} stops", n),
    };
    let meta = if leg.duration_label.is_empty() {
        stops
    } else {
        format!("{} · {}", leg.duration_label, stops)
    };
    format!(
        "  {} {} -> {} {}   {}\n",
        leg.depart_time, leg.origin_label, leg.arrive_time, leg.dest_label, meta
    )
}

fn fields(it: &Itinerary) -> [String; 15] {
    let price = it.price.map(|p| p.to_string()).unwrap_or_default();
    let out = &it.outbound;
    let ret = it.return_leg.as_ref();
    let leg_fields = |leg: Option<&LegView>| -> [String; 6] {
        match leg {
            Some(l) => [
                l.depart_time.clone(),
                l.origin_label.clone(),
                l.arrive_time.clone(),
                l.dest_label.clone(),
                l.stop_count.to_string(),
                l.duration_minutes.map(|d| d.to_string()).unwrap_or_default(),
            ],
            None => Default::default(),
        }
    };
    let [od, of, oa, ot, os, om] = leg_fields(Some(out));
    let [rd, rf, ra, rt, rs, rm] = leg_fields(ret);
    [
        it.carrier_name.clone().unwrap_or_default(),
        it.flight_label.clone().unwrap_or_default(),
        price,
        od,
        of,
        oa,
        ot,
        os,
        om,
        rd,
        rf,
        ra,
        rt,
        rs,
        rm,
    ]
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn escape_tsv_field(field: &str) -> String {
    field
        .replace('\t', " ")
        .replace('\n', " ")
        .replace('\r', " ")
}
