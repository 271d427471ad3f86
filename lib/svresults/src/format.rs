use std::fmt;

/// [SPARQL query](https://www.w3.org/TR/sparql11-query/) results separated-values formats.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QueryResultsFormat {
    /// [SPARQL Query Results CSV Format](https://www.w3.org/TR/sparql11-results-csv-tsv/)
    Csv,
    /// [SPARQL Query Results TSV Format](https://www.w3.org/TR/sparql11-results-csv-tsv/)
    Tsv,
}

impl QueryResultsFormat {
    /// All the supported formats.
    pub const ALL: [Self; 2] = [Self::Csv, Self::Tsv];

    /// The format canonical IRI according to the [Unique URIs for file formats registry](https://www.w3.org/ns/formats/).
    ///
    /// ```
    /// use svresults::QueryResultsFormat;
    ///
    /// assert_eq!(
    ///     QueryResultsFormat::Tsv.iri(),
    ///     "http://www.w3.org/ns/formats/SPARQL_Results_TSV"
    /// )
    /// ```
    #[inline]
    pub const fn iri(self) -> &'static str {
        match self {
            Self::Csv => "http://www.w3.org/ns/formats/SPARQL_Results_CSV",
            Self::Tsv => "http://www.w3.org/ns/formats/SPARQL_Results_TSV",
        }
    }

    /// All the URIs identifying the format: its canonical IRI, the SPARQL 1.1 recommendation and the underlying generic format.
    #[inline]
    pub const fn uris(self) -> &'static [&'static str] {
        match self {
            Self::Csv => &[
                "http://www.w3.org/ns/formats/SPARQL_Results_CSV",
                "http://www.w3.org/TR/sparql11-results-csv-tsv/",
                "http://www.ietf.org/rfc/rfc4180.txt",
            ],
            Self::Tsv => &[
                "http://www.w3.org/ns/formats/SPARQL_Results_TSV",
                "http://www.w3.org/TR/sparql11-results-csv-tsv/",
                "http://www.iana.org/assignments/media-types/text/tab-separated-values",
            ],
        }
    }

    /// The format [IANA media type](https://tools.ietf.org/html/rfc2046).
    ///
    /// ```
    /// use svresults::QueryResultsFormat;
    ///
    /// assert_eq!(
    ///     QueryResultsFormat::Csv.media_type(),
    ///     "text/csv; charset=utf-8"
    /// )
    /// ```
    #[inline]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Tsv => "text/tab-separated-values; charset=utf-8",
        }
    }

    /// The media types to advertise for content negotiation with their quality, from 0 to 10.
    ///
    /// ```
    /// use svresults::QueryResultsFormat;
    ///
    /// assert_eq!(
    ///     QueryResultsFormat::Tsv.media_types(),
    ///     &[("text/tab-separated-values", 10)]
    /// )
    /// ```
    #[inline]
    pub const fn media_types(self) -> &'static [(&'static str, u8)] {
        match self {
            Self::Csv => &[("text/csv", 10), ("text/csv; header=present", 10)],
            Self::Tsv => &[("text/tab-separated-values", 10)],
        }
    }

    /// The format [IANA-registered](https://tools.ietf.org/html/rfc2046) file extension.
    ///
    /// ```
    /// use svresults::QueryResultsFormat;
    ///
    /// assert_eq!(QueryResultsFormat::Tsv.file_extension(), "tsv")
    /// ```
    #[inline]
    pub const fn file_extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }

    /// The short identifier of the format.
    ///
    /// ```
    /// use svresults::QueryResultsFormat;
    ///
    /// assert_eq!(QueryResultsFormat::Csv.name(), "csv")
    /// ```
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }

    /// A human readable label of the format.
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Csv => "Comma Separated Values (CSV)",
            Self::Tsv => "Tab Separated Values (TSV)",
        }
    }

    /// The description of the syntax used to write the format.
    #[inline]
    pub const fn descriptor(self) -> FormatDescriptor {
        match self {
            Self::Csv => FormatDescriptor {
                separator: b',',
                eol: b"\r\n",
                variable_prefix: None,
                escaping: Escaping::Csv,
            },
            Self::Tsv => FormatDescriptor {
                separator: b'\t',
                eol: b"\n",
                variable_prefix: Some(b'?'),
                escaping: Escaping::Turtle,
            },
        }
    }

    /// Looks for a known format from its short identifier.
    ///
    /// ```
    /// use svresults::QueryResultsFormat;
    ///
    /// assert_eq!(QueryResultsFormat::from_name("TSV"), Some(QueryResultsFormat::Tsv))
    /// ```
    #[inline]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(name))
    }

    /// Looks for a known format from a media type.
    ///
    /// It supports some media type aliases.
    /// For example, "text/tsv" is going to return `Tsv` even if it is not its canonical media type.
    ///
    /// Example:
    /// ```
    /// use svresults::QueryResultsFormat;
    ///
    /// assert_eq!(
    ///     QueryResultsFormat::from_media_type("text/csv; header=present"),
    ///     Some(QueryResultsFormat::Csv)
    /// )
    /// ```
    #[inline]
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        const MEDIA_SUBTYPES: [(&str, QueryResultsFormat); 4] = [
            ("csv", QueryResultsFormat::Csv),
            ("plain", QueryResultsFormat::Csv),
            ("tab-separated-values", QueryResultsFormat::Tsv),
            ("tsv", QueryResultsFormat::Tsv),
        ];

        let (r#type, subtype) = media_type
            .split_once(';')
            .unwrap_or((media_type, ""))
            .0
            .trim()
            .split_once('/')?;
        let r#type = r#type.trim();
        if !r#type.eq_ignore_ascii_case("application") && !r#type.eq_ignore_ascii_case("text") {
            return None;
        }
        let subtype = subtype.trim();
        let subtype = subtype.strip_prefix("x-").unwrap_or(subtype);
        MEDIA_SUBTYPES
            .into_iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(subtype))
            .map(|(_, format)| format)
    }

    /// Looks for a known format from an extension.
    ///
    /// It supports some aliases.
    ///
    /// Example:
    /// ```
    /// use svresults::QueryResultsFormat;
    ///
    /// assert_eq!(
    ///     QueryResultsFormat::from_extension("csv"),
    ///     Some(QueryResultsFormat::Csv)
    /// )
    /// ```
    #[inline]
    pub fn from_extension(extension: &str) -> Option<Self> {
        const EXTENSIONS: [(&str, QueryResultsFormat); 4] = [
            ("csv", QueryResultsFormat::Csv),
            ("tab", QueryResultsFormat::Tsv),
            ("tsv", QueryResultsFormat::Tsv),
            ("txt", QueryResultsFormat::Csv),
        ];
        EXTENSIONS
            .into_iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(extension))
            .map(|(_, format)| format)
    }
}

impl fmt::Display for QueryResultsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a format writes its fields.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct FormatDescriptor {
    /// Byte between two fields of a record.
    pub separator: u8,
    /// End of each record, the header included.
    pub eol: &'static [u8],
    /// Byte written before each variable name in the header.
    pub variable_prefix: Option<u8>,
    pub escaping: Escaping,
}

/// The escaping dialect of a format.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Escaping {
    /// Raw text, quoted on demand.
    Csv,
    /// Terms written with the Turtle/N-Triples syntax.
    Turtle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors() {
        let csv = QueryResultsFormat::Csv.descriptor();
        assert_eq!(csv.separator, b',');
        assert_eq!(csv.eol, b"\r\n");
        assert_eq!(csv.variable_prefix, None);
        assert_eq!(csv.escaping, Escaping::Csv);
        let tsv = QueryResultsFormat::Tsv.descriptor();
        assert_eq!(tsv.separator, b'\t');
        assert_eq!(tsv.eol, b"\n");
        assert_eq!(tsv.variable_prefix, Some(b'?'));
        assert_eq!(tsv.escaping, Escaping::Turtle);
    }

    #[test]
    fn lookups() {
        for format in QueryResultsFormat::ALL {
            assert_eq!(QueryResultsFormat::from_name(format.name()), Some(format));
            assert_eq!(
                QueryResultsFormat::from_extension(format.file_extension()),
                Some(format)
            );
            assert_eq!(
                QueryResultsFormat::from_media_type(format.media_type()),
                Some(format)
            );
            for (media_type, quality) in format.media_types() {
                assert_eq!(QueryResultsFormat::from_media_type(media_type), Some(format));
                assert_eq!(*quality, 10);
            }
            assert_eq!(format.uris()[0], format.iri());
        }
        assert_eq!(
            QueryResultsFormat::from_media_type("text/x-tsv"),
            Some(QueryResultsFormat::Tsv)
        );
        assert_eq!(QueryResultsFormat::from_media_type("image/csv"), None);
        assert_eq!(QueryResultsFormat::from_media_type("csv"), None);
        assert_eq!(QueryResultsFormat::from_name("json"), None);
        assert_eq!(QueryResultsFormat::from_extension("srj"), None);
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(
            QueryResultsFormat::Csv.to_string(),
            "Comma Separated Values (CSV)"
        );
    }
}
