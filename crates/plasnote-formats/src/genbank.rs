use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{map_res, opt},
    sequence::{preceded, separated_pair},
    IResult,
};
use plasnote_core::{
    feature::{Feature, FeatureType, Location, Qualifier, Strand},
    sequence::{Sequence, SequenceMetadata, Topology},
};
use uuid::Uuid;

use crate::ParseError;

const QUALIFIER_INDENT: &str = "                     ";

/// Parse a GenBank format string into a Sequence
pub fn parse(input: &str) -> Result<Sequence, ParseError> {
    let mut seq = Sequence::new("", "", Topology::Linear);
    seq.metadata = SequenceMetadata::default();

    let lines: Vec<&str> = input.lines().collect();
    if !lines.iter().any(|l| l.starts_with("LOCUS")) {
        return Err(ParseError::InvalidFormat("missing LOCUS line".to_string()));
    }

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if line.starts_with("LOCUS") {
            parse_locus_line(line, &mut seq);
        } else if line.starts_with("DEFINITION") {
            let mut def = field_value(line).to_string();
            i += 1;
            while i < lines.len() && lines[i].starts_with("            ") {
                def.push(' ');
                def.push_str(lines[i].trim());
                i += 1;
            }
            seq.metadata.definition = Some(def.trim_end_matches('.').to_string());
            seq.description = seq.metadata.definition.clone().unwrap_or_default();
            continue;
        } else if line.starts_with("ACCESSION") {
            seq.metadata.accession = Some(field_value(line).to_string());
        } else if line.starts_with("KEYWORDS") {
            seq.metadata.keywords = Some(field_value(line).to_string());
        } else if line.starts_with("SOURCE") {
            seq.metadata.source = Some(field_value(line).to_string());
            i += 1;
            if i < lines.len() && lines[i].trim_start().starts_with("ORGANISM") {
                seq.metadata.organism = Some(lines[i].trim_start()[8..].trim().to_string());
                i += 1;
            }
            // Taxonomy lines
            while i < lines.len() && lines[i].starts_with(' ') {
                i += 1;
            }
            continue;
        } else if line.starts_with("COMMENT") {
            let mut comment = field_value(line).to_string();
            i += 1;
            while i < lines.len() && lines[i].starts_with("            ") {
                comment.push(' ');
                comment.push_str(lines[i].trim());
                i += 1;
            }
            seq.metadata.comments.push(comment.trim().to_string());
            continue;
        } else if line.starts_with("FEATURES") {
            i += 1;
            parse_features(&lines, &mut i, &mut seq.features)?;
            continue;
        } else if line.starts_with("ORIGIN") {
            i += 1;
            seq.sequence = parse_origin(&lines, &mut i);
            continue;
        }

        i += 1;
    }

    Ok(seq)
}

fn field_value(line: &str) -> &str {
    line.get(12..).unwrap_or("").trim()
}

fn parse_locus_line(line: &str, seq: &mut Sequence) {
    // LOCUS       name    length bp    type    topology    division    date
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() >= 2 {
        seq.name = parts[1].to_string();
    }

    for part in &parts {
        match *part {
            "circular" => seq.topology = Topology::Circular,
            "linear" => seq.topology = Topology::Linear,
            _ => {}
        }
    }

    seq.metadata.molecule_type = parts
        .iter()
        .find(|p| {
            let lower = p.to_lowercase();
            lower.contains("dna") || lower.contains("rna")
        })
        .map(|p| p.to_string());

    if parts.len() >= 6 {
        seq.metadata.division = parts[4..]
            .iter()
            .find(|p| p.len() == 3 && p.chars().all(|c| c.is_ascii_uppercase()))
            .map(|p| p.to_string());
    }

    if let Some(last) = parts.last() {
        if last.contains('-') && last.len() >= 9 {
            seq.metadata.date = Some(last.to_string());
        }
    }
}

fn parse_features(
    lines: &[&str],
    i: &mut usize,
    features: &mut Vec<Feature>,
) -> Result<(), ParseError> {
    while *i < lines.len() {
        let line = lines[*i];

        if line.starts_with("ORIGIN") || line.starts_with("//") || line.starts_with("CONTIG") {
            break;
        }
        if line.starts_with(char::is_alphabetic) {
            break;
        }

        if line.len() < 21 || !line.starts_with("     ") || line[5..].starts_with(' ') {
            *i += 1;
            continue;
        }

        // Feature key line: key at column 5, location at column 21
        let (Some(key), Some(location)) = (line.get(5..21), line.get(21..)) else {
            return Err(ParseError::InvalidFormat(format!(
                "feature line {} is not column aligned",
                *i + 1
            )));
        };
        let key = key.trim();
        let mut location_str = location.trim().to_string();

        *i += 1;
        while *i < lines.len() && is_continuation(lines[*i]) && !is_qualifier_start(lines[*i]) {
            location_str.push_str(lines[*i][21..].trim());
            *i += 1;
        }

        let mut qualifiers = Vec::new();
        while *i < lines.len() && is_qualifier_start(lines[*i]) {
            let qual_content = &lines[*i][21..].trim()[1..];
            *i += 1;

            match qual_content.split_once('=') {
                Some((qkey, first)) => {
                    let mut qval = first.to_string();
                    while *i < lines.len()
                        && is_continuation(lines[*i])
                        && !is_qualifier_start(lines[*i])
                    {
                        qval.push(' ');
                        qval.push_str(lines[*i][21..].trim());
                        *i += 1;
                    }
                    qualifiers.push(Qualifier {
                        key: qkey.to_string(),
                        value: qval.trim_matches('"').to_string(),
                    });
                }
                None => qualifiers.push(Qualifier {
                    key: qual_content.to_string(),
                    value: String::new(),
                }),
            }
        }

        let (location, strand) = parse_location(&location_str)?;
        let feature_type = FeatureType::from_genbank_key(key);

        // Prefer label, then gene, then product, then note
        let name = ["label", "gene", "product", "note"]
            .iter()
            .find_map(|k| qualifiers.iter().find(|q| q.key == *k))
            .map(|q| q.value.clone())
            .unwrap_or_else(|| key.to_string());

        let color = qualifiers
            .iter()
            .find(|q| q.key == "ApEinfo_fwdcolor" || q.key == "color")
            .map(|q| q.value.clone());

        features.push(Feature {
            id: Uuid::new_v4(),
            name,
            feature_type,
            location,
            strand,
            color,
            qualifiers,
        });
    }
    Ok(())
}

fn is_continuation(line: &str) -> bool {
    line.len() > 21 && line.starts_with(QUALIFIER_INDENT)
}

fn is_qualifier_start(line: &str) -> bool {
    is_continuation(line) && line[21..].trim_start().starts_with('/')
}

fn parse_location(loc_str: &str) -> Result<(Location, Strand), ParseError> {
    let trimmed = loc_str.trim();

    if let Some(inner) = strip_call(trimmed, "complement") {
        let (loc, _) = parse_location(inner)?;
        return Ok((loc, Strand::Reverse));
    }

    if let Some(inner) = strip_call(trimmed, "join").or_else(|| strip_call(trimmed, "order")) {
        let ranges = inner
            .split(',')
            .map(|part| {
                parse_simple_range(part.trim())
                    .ok_or_else(|| ParseError::InvalidLocation(loc_str.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok((Location::Join { ranges }, Strand::Forward));
    }

    if let Some((start, end)) = parse_simple_range(trimmed) {
        return Ok((Location::simple(start, end), Strand::Forward));
    }

    // Single position
    match position(trimmed) {
        Ok(("", pos)) => {
            let pos = pos.saturating_sub(1);
            Ok((Location::simple(pos, pos + 1), Strand::Forward))
        }
        _ => Err(ParseError::InvalidLocation(loc_str.to_string())),
    }
}

fn strip_call<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn position(input: &str) -> IResult<&str, usize> {
    preceded(
        opt(alt((char('<'), char('>')))),
        map_res(digit1, |d: &str| d.parse::<usize>()),
    )(input)
}

fn range(input: &str) -> IResult<&str, (usize, usize)> {
    separated_pair(position, tag(".."), position)(input)
}

/// `100..200`, `<100..>200` -> 0-based half-open `(99, 200)`
fn parse_simple_range(s: &str) -> Option<(usize, usize)> {
    match range(s) {
        Ok(("", (start, end))) => Some((start.saturating_sub(1), end)),
        _ => None,
    }
}

fn parse_origin(lines: &[&str], i: &mut usize) -> String {
    let mut seq = String::new();

    while *i < lines.len() {
        let line = lines[*i];
        if line.starts_with("//") {
            break;
        }
        // "        1 atcgatcg atcgatcg ..."
        seq.extend(
            line.chars()
                .filter(|c| c.is_ascii_alphabetic())
                .map(|c| c.to_ascii_uppercase()),
        );
        *i += 1;
    }

    seq
}

/// Serialize a Sequence to GenBank format
pub fn serialize(seq: &Sequence) -> String {
    let mut out = String::new();

    let mol_type = seq.metadata.molecule_type.as_deref().unwrap_or("DNA");
    let division = seq.metadata.division.as_deref().unwrap_or("SYN");
    let date = seq.metadata.date.as_deref().unwrap_or("01-JAN-1970");
    let name = if seq.name.is_empty() { "unnamed" } else { &seq.name };

    out.push_str(&format!(
        "LOCUS       {:<16} {} bp    {}     {}       {} {}\n",
        name,
        seq.len(),
        mol_type,
        seq.topology,
        division,
        date
    ));

    if !seq.description.is_empty() {
        out.push_str(&format!("DEFINITION  {}.\n", seq.description));
    }
    if let Some(acc) = &seq.metadata.accession {
        out.push_str(&format!("ACCESSION   {}\n", acc));
    }
    if let Some(kw) = &seq.metadata.keywords {
        out.push_str(&format!("KEYWORDS    {}\n", kw));
    }
    if let Some(src) = &seq.metadata.source {
        out.push_str(&format!("SOURCE      {}\n", src));
        if let Some(org) = &seq.metadata.organism {
            out.push_str(&format!("  ORGANISM  {}\n", org));
        }
    }
    for comment in &seq.metadata.comments {
        out.push_str(&format!("COMMENT     {}\n", comment));
    }

    out.push_str("FEATURES             Location/Qualifiers\n");
    for feat in &seq.features {
        let key = feat.feature_type.to_genbank_key();
        let loc_str = serialize_location(&feat.location, feat.strand);
        out.push_str(&format!("     {:<16}{}\n", key, loc_str));

        for q in &feat.qualifiers {
            if q.value.is_empty() {
                out.push_str(&format!("{}/{}\n", QUALIFIER_INDENT, q.key));
            } else if q.value.parse::<f64>().is_ok() {
                out.push_str(&format!("{}/{}={}\n", QUALIFIER_INDENT, q.key, q.value));
            } else {
                out.push_str(&format!(
                    "{}/{}=\"{}\"\n",
                    QUALIFIER_INDENT,
                    q.key,
                    q.value.replace('"', "'")
                ));
            }
        }
    }

    out.push_str("ORIGIN\n");
    let bases = seq.sequence.to_lowercase();
    for (chunk_idx, chunk) in bases.as_bytes().chunks(60).enumerate() {
        out.push_str(&format!("{:>9}", chunk_idx * 60 + 1));
        for block in chunk.chunks(10) {
            out.push(' ');
            out.push_str(&String::from_utf8_lossy(block));
        }
        out.push('\n');
    }

    out.push_str("//\n");
    out
}

fn serialize_location(loc: &Location, strand: Strand) -> String {
    let loc_str = match loc {
        Location::Simple { start, end } => format!("{}..{}", start + 1, end),
        Location::Join { ranges } => {
            let parts: Vec<String> = ranges
                .iter()
                .map(|(s, e)| format!("{}..{}", s + 1, e))
                .collect();
            format!("join({})", parts.join(","))
        }
    };

    match strand {
        Strand::Reverse => format!("complement({})", loc_str),
        _ => loc_str,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI_GENBANK: &str = r#"LOCUS       pTest           100 bp    DNA     circular SYN 01-JAN-2026
DEFINITION  Test plasmid.
ACCESSION   .
KEYWORDS    .
SOURCE      synthetic construct
  ORGANISM  synthetic construct
FEATURES             Location/Qualifiers
     promoter        1..20
                     /label="test promoter"
     CDS             complement(30..90)
                     /label="GFP"
                     /gene="gfp"
                     /codon_start=1
     rep_origin      join(95..100,1..5)
                     /label="wrap"
ORIGIN
        1 atcgatcgat cgatcgatcg atcgatcgat cgatcgatcg atcgatcgat
       51 cgatcgatcg atcgatcgat cgatcgatcg atcgatcgat cgatcgatcg
//
"#;

    #[test]
    fn test_parse_mini_genbank() {
        let seq = parse(MINI_GENBANK).unwrap();
        assert_eq!(seq.name, "pTest");
        assert_eq!(seq.topology, Topology::Circular);
        assert_eq!(seq.len(), 100);
        assert_eq!(seq.features.len(), 3);
        assert_eq!(seq.metadata.division.as_deref(), Some("SYN"));
    }

    #[test]
    fn test_parse_features() {
        let seq = parse(MINI_GENBANK).unwrap();

        let promoter = &seq.features[0];
        assert_eq!(promoter.name, "test promoter");
        assert_eq!(promoter.feature_type, FeatureType::Promoter);
        assert_eq!(promoter.start(), 0);
        assert_eq!(promoter.end(), 20);
        assert_eq!(promoter.strand, Strand::Forward);

        let cds = &seq.features[1];
        assert_eq!(cds.name, "GFP");
        assert_eq!(cds.feature_type, FeatureType::Cds);
        assert_eq!(cds.start(), 29);
        assert_eq!(cds.end(), 90);
        assert_eq!(cds.strand, Strand::Reverse);

        let wrap = &seq.features[2];
        assert_eq!(wrap.location, Location::wrapped(94, 105, 100));
    }

    #[test]
    fn test_roundtrip() {
        let seq = parse(MINI_GENBANK).unwrap();
        let reparsed = parse(&serialize(&seq)).unwrap();

        assert_eq!(reparsed.name, seq.name);
        assert_eq!(reparsed.topology, seq.topology);
        assert_eq!(reparsed.sequence, seq.sequence);
        assert_eq!(reparsed.features.len(), seq.features.len());
        assert_eq!(reparsed.features[2].location, seq.features[2].location);
    }

    #[test]
    fn test_parse_location_forms() {
        let (loc, strand) = parse_location("100..200").unwrap();
        assert_eq!((loc.start(), loc.end(), strand), (99, 200, Strand::Forward));

        let (loc, strand) = parse_location("complement(<100..>200)").unwrap();
        assert_eq!((loc.start(), loc.end(), strand), (99, 200, Strand::Reverse));

        let (loc, _) = parse_location("42").unwrap();
        assert_eq!(loc, Location::simple(41, 42));

        let (loc, strand) = parse_location("complement(join(100..200,300..400))").unwrap();
        assert_eq!(strand, Strand::Reverse);
        assert_eq!(
            loc,
            Location::Join {
                ranges: vec![(99, 200), (299, 400)]
            }
        );
    }

    #[test]
    fn test_parse_location_rejects_garbage() {
        assert!(parse_location("100..").is_err());
        assert!(parse_location("join(1..2,x)").is_err());
    }

    #[test]
    fn test_misaligned_multibyte_feature_key_is_error() {
        // 'é' straddles byte 21, where the location column starts
        let text = "LOCUS       pX 4 bp DNA linear\nFEATURES             Location/Qualifiers\n     promoterxxxxxxxé1..4\nORIGIN\n        1 acgt\n//\n";
        assert!(matches!(parse(text), Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_locus_is_error() {
        assert!(parse("ORIGIN\n        1 acgt\n//\n").is_err());
    }
}
