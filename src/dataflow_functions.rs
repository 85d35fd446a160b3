//! The closed set of transform functions the legacy engine exposes, with
//! their Spark SQL templates.
//!
//! Each entry declares its arity up front: [Signature::required] arguments
//! must come from the statement, and missing trailing arguments are filled
//! from [Signature::defaults] before the template runs. Templates are pure
//! string formatting over already-translated argument text. The few that
//! need a number (span-length arithmetic) read it from literal argument
//! text at translation time; that only works for compile-time literals,
//! and column references degrade to a commented reassembly.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataflowFunction {
    IsValid,
    IsNull,
    IsBlank,
    IsDefined,
    LengthOf,
    StringFilter,
    StringFilterOut,
    StringIndex,
    StringLpad,
    StringLrtrim,
    StringLtrim,
    StringRepad,
    StringReplace,
    StringRindex,
    StringSubstring,
    ReGetMatch,
    ReIndex,
    ReReplace,
    ReSplit,
    StringLike,
    StringJoin,
    StringPrefix,
    StringSuffix,
    StringIsAlphabetic,
    StringIsNumeric,
    ReGetRangeMatches,
    StringConcat,
    StringUpper,
    StringLower,
    Today,
    Now,
    Datetime,
    DateToString,
    StringToDate,
    DateAdd,
    DateYear,
    DateMonth,
    DateDay,
    Sqrt,
    Power,
    Mod,
    Round,
    ReinterpretAs,
    Lookup,
    DecimalStrip,
    CharString,
    DecimalLpad,
    EndsWith,
    ReMatchReplace,
    StartsWith,
    DateDifferenceDays,
    DateAddMonths,
    DatetimeFromUnixtime,
    Abs,
    Ceil,
    Floor,
    ToXml,
    XmlGetElement,
    ToJson,
    LookupCount,
    LookupMatch,
    ForceError,
    LogError,
}

/// Arity metadata for one registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Arguments the caller must supply.
    pub required: usize,
    /// Literals for optional trailing arguments, in position order.
    pub defaults: &'static [&'static str],
    /// Accepts any number of arguments beyond [required].
    pub variadic: bool,
}

impl Signature {
    const fn exact(required: usize) -> Self {
        Signature {
            required,
            defaults: &[],
            variadic: false,
        }
    }

    const fn with_defaults(required: usize, defaults: &'static [&'static str]) -> Self {
        Signature {
            required,
            defaults,
            variadic: false,
        }
    }

    /// Total argument count once defaults are filled in.
    pub fn full(&self) -> usize {
        self.required + self.defaults.len()
    }
}

impl DataflowFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        use DataflowFunction::*;
        Some(match name.to_ascii_lowercase().as_str() {
            "is_valid" => IsValid,
            "is_null" => IsNull,
            "is_blank" => IsBlank,
            "is_defined" => IsDefined,
            "length_of" => LengthOf,
            "string_filter" => StringFilter,
            "string_filter_out" => StringFilterOut,
            "string_index" => StringIndex,
            "string_lpad" => StringLpad,
            "string_lrtrim" => StringLrtrim,
            "string_ltrim" => StringLtrim,
            "string_repad" => StringRepad,
            "string_replace" => StringReplace,
            "string_rindex" => StringRindex,
            "string_substring" => StringSubstring,
            "re_get_match" => ReGetMatch,
            "re_index" => ReIndex,
            "re_replace" => ReReplace,
            "re_split" => ReSplit,
            "string_like" => StringLike,
            "string_join" => StringJoin,
            "string_prefix" => StringPrefix,
            "string_suffix" => StringSuffix,
            "string_is_alphabetic" => StringIsAlphabetic,
            "string_is_numeric" => StringIsNumeric,
            "re_get_range_matches" => ReGetRangeMatches,
            "string_concat" => StringConcat,
            "string_upper" => StringUpper,
            "string_lower" => StringLower,
            "today" => Today,
            "now" => Now,
            "datetime" => Datetime,
            "date_to_string" => DateToString,
            "string_to_date" => StringToDate,
            "date_add" => DateAdd,
            "date_year" => DateYear,
            "date_month" => DateMonth,
            "date_day" => DateDay,
            "sqrt" => Sqrt,
            "power" => Power,
            "mod" => Mod,
            "round" => Round,
            "reinterpret_as" => ReinterpretAs,
            "lookup" => Lookup,
            "decimal_strip" => DecimalStrip,
            "char_string" => CharString,
            "decimal_lpad" => DecimalLpad,
            "ends_with" => EndsWith,
            "re_match_replace" => ReMatchReplace,
            "starts_with" => StartsWith,
            "date_difference_days" => DateDifferenceDays,
            "date_add_months" => DateAddMonths,
            "datetime_from_unixtime" => DatetimeFromUnixtime,
            "abs" => Abs,
            "ceil" => Ceil,
            "floor" => Floor,
            "to_xml" => ToXml,
            "xml_get_element" => XmlGetElement,
            "to_json" => ToJson,
            "lookup_count" => LookupCount,
            "lookup_match" => LookupMatch,
            "force_error" => ForceError,
            "log_error" => LogError,
            _ => return None,
        })
    }

    pub fn signature(&self) -> Signature {
        use DataflowFunction::*;
        match self {
            Today | Now => Signature::exact(0),

            IsNull | IsBlank | IsDefined | LengthOf | StringLrtrim | StringLtrim | StringUpper
            | StringLower | StringIsAlphabetic | StringIsNumeric | DateYear | DateMonth
            | DateDay | Sqrt | DecimalStrip | CharString | DatetimeFromUnixtime | Abs | Ceil
            | Floor | ToXml | ToJson | ForceError | LogError => Signature::exact(1),

            IsValid | StringFilter | StringFilterOut | StringIndex | StringRindex | StringLike
            | StringJoin | StringPrefix | StringSuffix | ReGetMatch | ReIndex | ReSplit
            | DateToString | StringToDate | Power | Mod | ReinterpretAs | Lookup | EndsWith
            | StartsWith | DateDifferenceDays | DateAddMonths | XmlGetElement | LookupCount
            | LookupMatch => Signature::exact(2),

            StringRepad | StringReplace | StringSubstring | ReReplace | ReMatchReplace => {
                Signature::exact(3)
            }

            ReGetRangeMatches => Signature::exact(4),

            Round => Signature::with_defaults(1, &["0"]),
            Datetime => Signature::with_defaults(1, &["CURRENT_TIMESTAMP()"]),
            StringLpad | DecimalLpad => Signature::with_defaults(2, &["'0'"]),
            DateAdd => Signature::with_defaults(2, &["day"]),

            StringConcat => Signature {
                required: 1,
                defaults: &[],
                variadic: true,
            },
        }
    }

    /// Renders the Spark SQL text for this function. [args] are translated
    /// and already padded to the signature's full length (or at least the
    /// required length for variadic entries).
    pub fn render(&self, args: &[String]) -> String {
        use DataflowFunction::*;
        match self {
            // is_valid(v, t) => TRY_CAST(v AS T) IS NOT NULL
            IsValid => format!(
                "TRY_CAST({} AS {}) IS NOT NULL",
                args[0],
                sql_type(&args[1])
            ),
            // is_null(v) => v IS NULL
            IsNull => format!("{} IS NULL", args[0]),
            // is_blank(v) => (v IS NULL OR v = '')
            IsBlank => format!("({0} IS NULL OR {0} = '')", args[0]),
            // is_defined(v) => v IS NOT NULL
            IsDefined => format!("{} IS NOT NULL", args[0]),
            // length_of(c) => LENGTH(c)
            LengthOf => format!("LENGTH({})", args[0]),
            // string_filter(c, keep) => strip everything outside the class
            StringFilter => format!("REGEXP_REPLACE({}, '[^{}]', '')", args[0], args[1]),
            // string_filter_out(c, drop) => strip everything inside the class
            StringFilterOut => format!("REGEXP_REPLACE({}, '[{}]', '')", args[0], args[1]),
            // string_index(c, s) => INSTR(c, s)
            StringIndex => format!("INSTR({}, {})", args[0], args[1]),
            // string_lpad(c, n, ch) => LPAD(c, n, ch)
            StringLpad => format!("LPAD({}, {}, {})", args[0], args[1], args[2]),
            // string_lrtrim(c) => TRIM(c)
            StringLrtrim => format!("TRIM({})", args[0]),
            // string_ltrim(c) => LTRIM(c)
            StringLtrim => format!("LTRIM({})", args[0]),
            // string_repad(c, n, ch) => RPAD(c, n, ch)
            StringRepad => format!("RPAD({}, {}, {})", args[0], args[1], args[2]),
            // string_replace(c, o, n) => REPLACE(c, o, n)
            StringReplace => format!("REPLACE({}, {}, {})", args[0], args[1], args[2]),
            // string_rindex(c, s): position of the last occurrence, built
            // from INSTR over the reversed strings
            StringRindex => format!(
                "LENGTH({0}) - INSTR(REVERSE({0}), REVERSE({1})) + 1",
                args[0], args[1]
            ),
            // string_substring(c, p, n) => SUBSTRING(c, p, n)
            StringSubstring => format!("SUBSTRING({}, {}, {})", args[0], args[1], args[2]),
            // re_get_match(c, re) => REGEXP_EXTRACT(c, re, 0)
            ReGetMatch => format!("REGEXP_EXTRACT({}, {}, 0)", args[0], args[1]),
            // re_index(c, re) => REGEXP_INSTR(c, re)
            ReIndex => format!("REGEXP_INSTR({}, {})", args[0], args[1]),
            // re_replace(c, re, r) => REGEXP_REPLACE(c, re, r)
            ReReplace | ReMatchReplace => {
                format!("REGEXP_REPLACE({}, {}, {})", args[0], args[1], args[2])
            }
            // re_split(c, re) => SPLIT(c, re)
            ReSplit => format!("SPLIT({}, {})", args[0], args[1]),
            // string_like(c, p) => c LIKE p
            StringLike => format!("{} LIKE {}", args[0], args[1]),
            // string_join(v, d): legacy vectors become arrays
            StringJoin => format!(
                "ARRAY_JOIN({}, {})",
                args[0].replace("vector", "array"),
                args[1]
            ),
            // string_prefix(c, p) => STARTSWITH(c, p)
            StringPrefix | StartsWith => format!("STARTSWITH({}, {})", args[0], args[1]),
            // string_suffix(c, s) => ENDSWITH(c, s)
            StringSuffix | EndsWith => format!("ENDSWITH({}, {})", args[0], args[1]),
            StringIsAlphabetic => format!("REGEXP_LIKE({}, '^[A-Za-z]+$')", args[0]),
            StringIsNumeric => format!("REGEXP_LIKE({}, '^[0-9]+$')", args[0]),
            // re_get_range_matches(c, s, e, re) needs the span length
            // e - s + 1, which is only computable from literal positions.
            ReGetRangeMatches => {
                match (args[1].trim().parse::<i64>(), args[2].trim().parse::<i64>()) {
                    (Ok(start), Ok(end)) => format!(
                        "SPLIT(SUBSTRING({}, {}, {}), '[^0-9]+')",
                        args[0],
                        args[1],
                        end - start + 1
                    ),
                    _ => format!(
                        "/* re_get_range_matches requires literal start/end positions */ {}",
                        render_call("re_get_range_matches", args)
                    ),
                }
            }
            // string_concat(a, ...) => CONCAT(a, ...)
            StringConcat => format!("CONCAT({})", args.join(", ")),
            StringUpper => format!("UPPER({})", args[0]),
            StringLower => format!("LOWER({})", args[0]),
            Today => "CURRENT_DATE()".to_string(),
            Now => "CURRENT_TIMESTAMP()".to_string(),
            // datetime(fmt, v): the engine always emitted microsecond
            // timestamps regardless of fmt
            Datetime => format!("DATE_FORMAT({}, 'yyyy-MM-dd HH:mm:ss.SSSSSS')", args[1]),
            // date_to_string(d, fmt) => DATE_FORMAT with rewritten tokens
            DateToString => format!("DATE_FORMAT({}, {})", args[0], spark_format(&args[1])),
            // string_to_date(s, fmt) => TO_DATE with rewritten tokens
            StringToDate => format!("TO_DATE({}, {})", args[0], spark_format(&args[1])),
            // date_add(d, n, unit): plain DATE_ADD for days, otherwise an
            // INTERVAL expression
            DateAdd => {
                if args[2].eq_ignore_ascii_case("day") {
                    format!("DATE_ADD({}, {})", args[0], args[1])
                } else {
                    format!("expr({} + INTERVAL {} {})", args[0], args[1], args[2])
                }
            }
            DateYear => format!("YEAR({})", args[0]),
            DateMonth => format!("MONTH({})", args[0]),
            DateDay => format!("DAY({})", args[0]),
            Sqrt => format!("SQRT({})", args[0]),
            Power => format!("POW({}, {})", args[0], args[1]),
            Mod => format!("MOD({}, {})", args[0], args[1]),
            Round => format!("ROUND({}, {})", args[0], args[1]),
            // reinterpret_as(v, t) => CAST(v AS T)
            ReinterpretAs => format!("CAST({} AS {})", args[0], sql_type(&args[1])),
            // lookup(f, v) conceptually becomes a join; flagged because a
            // projection slot cannot carry a FROM-clause rewrite.
            Lookup => {
                let table = strip_quotes(&args[0]);
                format!(
                    "/* lookup requires a join clause */ LEFT JOIN {table} ON {val} = {table}.{field}",
                    val = args[1],
                    field = trailing_segment(&args[1]),
                )
            }
            // decimal_strip(c) => fixed-scale decimal
            DecimalStrip => format!("CAST(ROUND({}, 2) AS DECIMAL(38,2))", args[0]),
            // char_string(n) => CHR(n)
            CharString => format!("CHR({})", args[0]),
            // decimal_lpad(v, n, ch): stringify the number first
            DecimalLpad => format!(
                "LPAD(CAST({} AS STRING), {}, {})",
                args[0], args[1], args[2]
            ),
            DateDifferenceDays => format!("DATEDIFF({}, {})", args[0], args[1]),
            DateAddMonths => format!("ADD_MONTHS({}, {})", args[0], args[1]),
            DatetimeFromUnixtime => format!("FROM_UNIXTIME({})", args[0]),
            Abs => format!("ABS({})", args[0]),
            Ceil => format!("CEIL({})", args[0]),
            Floor => format!("FLOOR({})", args[0]),
            ToXml => format!("/* to_xml not natively supported in Spark SQL */ {}", args[0]),
            XmlGetElement => format!(
                "/* xml_get_element requires UDF or external library */ xpath({}, '//{}')",
                args[0], args[1]
            ),
            ToJson => format!("TO_JSON({})", args[0]),
            // lookup_count(f, v): an aggregate over the lookup table, which
            // cannot live in a projection slot either
            LookupCount => {
                let table = strip_quotes(&args[0]);
                format!(
                    "/* lookup_count requires aggregation */ COUNT(*) FROM {table} WHERE {field} = {val}",
                    val = args[1],
                    field = trailing_segment(&args[1]),
                )
            }
            // lookup_match(f, v) => EXISTS subquery
            LookupMatch => {
                let table = strip_quotes(&args[0]);
                format!(
                    "EXISTS(SELECT 1 FROM {table} WHERE {field} = {val})",
                    val = args[1],
                    field = trailing_segment(&args[1]),
                )
            }
            ForceError => format!("ASSERT(FALSE, {})", args[0]),
            LogError => format!("/* log_error not supported in Spark SQL */ {}", args[0]),
        }
    }
}

/// Renders a plain `name(a, b, c)` call; shared by templates and by the
/// translator's fallback paths.
pub fn render_call(name: &str, args: &[String]) -> String {
    format!("{}({})", name, args.join(", "))
}

/// Type arguments arrive as quoted literals; SQL wants the bare name.
fn sql_type(arg: &str) -> String {
    strip_quotes(arg).to_uppercase()
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

/// `a.b.c` => `c`; names the join column for the lookup family.
fn trailing_segment(s: &str) -> &str {
    s.rsplit('.').next().unwrap_or(s)
}

/// Rewrites date-format tokens from the source dialect to Spark's:
/// `YYYY`→`yyyy`, `HH24`→`HH`, `MI`→`mm`, `SS`→`ss`.
fn spark_format(fmt: &str) -> String {
    fmt.replace("YYYY", "yyyy")
        .replace("HH24", "HH")
        .replace("MI", "mm")
        .replace("SS", "ss")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(
            DataflowFunction::from_name("string_upper"),
            Some(DataflowFunction::StringUpper)
        );
        assert_eq!(
            DataflowFunction::from_name("STRING_UPPER"),
            Some(DataflowFunction::StringUpper)
        );
        assert_eq!(DataflowFunction::from_name("no_such_fn"), None);
    }

    #[test]
    fn defaults_are_declared_per_entry() {
        let sig = DataflowFunction::StringLpad.signature();
        assert_eq!(sig.required, 2);
        assert_eq!(sig.defaults, &["'0'"]);
        assert_eq!(sig.full(), 3);

        assert_eq!(DataflowFunction::Round.signature().defaults, &["0"]);
        assert!(DataflowFunction::StringConcat.signature().variadic);
        assert_eq!(DataflowFunction::Today.signature().required, 0);
    }

    #[test]
    fn date_format_tokens_are_rewritten() {
        assert_eq!(
            DataflowFunction::DateToString.render(&owned(&["d", "'YYYY-MM-DD HH24:MI:SS'"])),
            "DATE_FORMAT(d, 'yyyy-MM-DD HH:mm:ss')"
        );
        assert_eq!(
            DataflowFunction::StringToDate.render(&owned(&["s", "'YYYYMMDD'"])),
            "TO_DATE(s, 'yyyyMMDD')"
        );
    }

    #[test]
    fn range_matches_computes_length_from_literals() {
        assert_eq!(
            DataflowFunction::ReGetRangeMatches.render(&owned(&["c", "3", "7", "'[0-9]'"])),
            "SPLIT(SUBSTRING(c, 3, 5), '[^0-9]+')"
        );
    }

    #[test]
    fn range_matches_rejects_column_positions() {
        let out = DataflowFunction::ReGetRangeMatches.render(&owned(&["c", "start_col", "7", "'x'"]));
        assert!(out.starts_with("/* re_get_range_matches requires literal start/end positions */"));
        assert!(out.contains("re_get_range_matches(c, start_col, 7, 'x')"));
    }

    #[test]
    fn lookup_expands_to_flagged_join() {
        assert_eq!(
            DataflowFunction::Lookup.render(&owned(&["\"ref_rates\"", "code"])),
            "/* lookup requires a join clause */ LEFT JOIN ref_rates ON code = ref_rates.code"
        );
    }

    #[test]
    fn lookup_match_is_an_exists_subquery() {
        assert_eq!(
            DataflowFunction::LookupMatch.render(&owned(&["\"ref_rates\"", "t.code"])),
            "EXISTS(SELECT 1 FROM ref_rates WHERE code = t.code)"
        );
    }

    #[test]
    fn vector_argument_becomes_array() {
        assert_eq!(
            DataflowFunction::StringJoin.render(&owned(&["vector(a, b)", "','"])),
            "ARRAY_JOIN(array(a, b), ',')"
        );
    }

    #[test]
    fn cast_type_is_unquoted_and_uppercased() {
        assert_eq!(
            DataflowFunction::ReinterpretAs.render(&owned(&["v", "\"decimal(10,2)\""])),
            "CAST(v AS DECIMAL(10,2))"
        );
        assert_eq!(
            DataflowFunction::IsValid.render(&owned(&["v", "\"date\""])),
            "TRY_CAST(v AS DATE) IS NOT NULL"
        );
    }

    #[test]
    fn interval_units_other_than_day() {
        assert_eq!(
            DataflowFunction::DateAdd.render(&owned(&["d", "3", "day"])),
            "DATE_ADD(d, 3)"
        );
        assert_eq!(
            DataflowFunction::DateAdd.render(&owned(&["d", "3", "month"])),
            "expr(d + INTERVAL 3 month)"
        );
    }
}
