use plasnote_core::feature::{Feature, FeatureType, Location, Strand};
use plasnote_core::sequence::{Sequence, Topology};
use plasnote_formats::genbank;
use pretty_assertions::assert_eq;

const PLASMID_GB: &str = r#"LOCUS       pDemo                    120 bp    DNA     circular SYN 19-OCT-2026
DEFINITION  Demo construct with an origin-spanning primer site.
ACCESSION   .
KEYWORDS    .
SOURCE      synthetic DNA construct
  ORGANISM  synthetic DNA construct
            other sequences; artificial sequences.
COMMENT     Annotated by plasnote.
FEATURES             Location/Qualifiers
     primer_bind     join(111..120,1..7)
                     /label="M13 fwd"
                     /note="wraps the origin"
     promoter        20..38
                     /label="T7 promoter"
                     /identity=100.0
     terminator      complement(50..97)
                     /label="T7 terminator"
                     /fragment
ORIGIN
        1 gtaaaacgac ggccagtacg taatacgact cactataggg cgaattctag cataacccct
       61 tggggcctct aaacgggtct tgaggggttt tttgacgtac gtacgtacgt acgtgtaaaa
//
"#;

#[test]
fn test_parse_demo_basic_fields() {
    let seq = genbank::parse(PLASMID_GB).unwrap();
    assert_eq!(seq.name, "pDemo");
    assert_eq!(seq.topology, Topology::Circular);
    assert_eq!(seq.len(), 120);
    assert_eq!(seq.metadata.organism.as_deref(), Some("synthetic DNA construct"));
    assert_eq!(seq.metadata.comments, vec!["Annotated by plasnote.".to_string()]);
}

#[test]
fn test_parse_demo_features() {
    let seq = genbank::parse(PLASMID_GB).unwrap();
    assert_eq!(seq.features.len(), 3);

    let primer = &seq.features[0];
    assert_eq!(primer.name, "M13 fwd");
    assert_eq!(primer.feature_type, FeatureType::PrimerBind);
    assert_eq!(primer.location, Location::wrapped(110, 127, 120));

    let promoter = seq
        .features
        .iter()
        .find(|f| f.name == "T7 promoter")
        .expect("T7 promoter not found");
    assert_eq!(promoter.start(), 19);
    assert_eq!(promoter.end(), 38);
    assert_eq!(promoter.get_qualifier("identity"), Some("100.0"));

    let terminator = &seq.features[2];
    assert_eq!(terminator.strand, Strand::Reverse);
    assert_eq!(terminator.get_qualifier("fragment"), Some(""));
}

#[test]
fn test_demo_roundtrip() {
    let seq = genbank::parse(PLASMID_GB).unwrap();
    let reparsed = genbank::parse(&genbank::serialize(&seq)).unwrap();

    assert_eq!(reparsed.name, seq.name);
    assert_eq!(reparsed.topology, seq.topology);
    assert_eq!(reparsed.sequence, seq.sequence);
    assert_eq!(reparsed.features.len(), seq.features.len());
    for (a, b) in seq.features.iter().zip(&reparsed.features) {
        assert_eq!(a.location, b.location);
        assert_eq!(a.strand, b.strand);
        assert_eq!(a.qualifiers, b.qualifiers);
    }
}

#[test]
fn test_serialize_built_sequence() {
    let mut seq = Sequence::new("built", "ACGT".repeat(20), Topology::Linear);
    let mut feature = Feature::new(
        "site",
        FeatureType::ProteinBind,
        Location::simple(4, 12),
        Strand::Reverse,
    );
    feature.add_qualifier("label", "site");
    seq.add_feature(feature);

    let text = genbank::serialize(&seq);
    assert!(text.starts_with("LOCUS       built"));
    assert!(text.contains("     protein_bind    complement(5..12)\n"));
    assert!(text.contains("                     /label=\"site\"\n"));
    assert!(text.contains("       61 acgtacgtac gtacgtacgt\n"));
    assert!(text.ends_with("//\n"));
}
