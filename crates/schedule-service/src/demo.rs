//! Demo problem generation.
//!
//! The demo problem has a fixed set of groups. Leaders come from a roster of
//! survey answers when one is configured, and from a built-in roster otherwise
//! or whenever the file cannot be used. A `.csv` roster is the survey export
//! itself, anything else is read as a JSON array of [`RosterEntry`].

use rand::seq::SliceRandom;
use regex::Regex;
use schedule_types::{Affinity, Group, Leader, LeaderSchedule};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RosterError {
	#[error("Failed to read roster: {0}")]
	Io(#[from] std::io::Error),

	#[error("Failed to parse roster: {0}")]
	Parse(#[from] serde_json::Error),

	#[error("Failed to parse survey: {0}")]
	Csv(#[from] csv::Error),

	#[error("Survey has no {0:?} column")]
	MissingColumn(&'static str),

	#[error("Invalid experience {value:?} for {name}")]
	Experience { name: String, value: String },

	#[error("Roster has no leaders")]
	Empty,
}

const NAME: &str = "Naam";
const WANTS_TO_LEAD: &str = "Ik wil volgend jaar in leiding staan";
const CHOICES: [&str; 3] = [
	"Mijn eerste keuze van groep",
	"Mijn tweede keuze van groep",
	"Mijn derde keuze van groep",
];
const EXPERIENCE: &str = "experience";
const HAS_PREFERRED: &str = "Is er een leider waar je graag mee in leiding zou staan?";
const HAS_UNWANTED: &str = "Is er een leider waar je niet graag mee in leiding zou staan?";
// The export leaves the colleague name columns unlabeled.
const PREFERRED_NAMES_COLUMN: usize = 7;
const UNWANTED_NAMES_COLUMN: usize = 9;

/// One survey answer.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
	pub name: String,
	#[serde(default = "default_wants_to_lead")]
	pub wants_to_lead: bool,
	/// Ranked group choices, first choice first.
	#[serde(default)]
	pub choices: Vec<String>,
	#[serde(default)]
	pub experience: u32,
	/// Free text naming colleagues, e.g. "Tom, Jef en Lars".
	#[serde(default)]
	pub preferred: Option<String>,
	#[serde(default)]
	pub unwanted: Option<String>,
}

fn default_wants_to_lead() -> bool {
	true
}

pub fn demo_groups() -> Vec<Group> {
	vec![
		Group::new("Speelclub", 2, 4),
		Group::new("Rakkers", 2, 3),
		Group::new("Toppers", 2, 2),
		Group::new("Kerels", 1, 2),
		Group::new("Aspiranten", 1, 2),
	]
}

pub struct DemoData {
	roster_path: Option<PathBuf>,
	separator: Regex,
}

impl DemoData {
	pub fn new(roster_path: Option<PathBuf>) -> Result<Self, regex::Error> {
		Ok(Self {
			roster_path,
			separator: Regex::new(r"[,;]|\ben\b|\band\b")?,
		})
	}

	/// Builds a fresh demo problem with the leaders in random order.
	pub async fn generate(&self) -> LeaderSchedule {
		let mut leaders = match &self.roster_path {
			Some(path) => match self.load_leaders(path).await {
				Ok(leaders) => {
					info!(count = leaders.len(), path = %path.display(), "Loaded roster");
					leaders
				}
				Err(e) => {
					warn!(path = %path.display(), error = %e, "Falling back to built-in roster");
					builtin_leaders()
				}
			},
			None => builtin_leaders(),
		};

		leaders.shuffle(&mut rand::thread_rng());
		LeaderSchedule::new(leaders, demo_groups())
	}

	async fn load_leaders(&self, path: &Path) -> Result<Vec<Leader>, RosterError> {
		let content = tokio::fs::read_to_string(path).await?;
		let entries = match path.extension().and_then(|ext| ext.to_str()) {
			Some(ext) if ext.eq_ignore_ascii_case("csv") => survey_entries(&content)?,
			_ => serde_json::from_str(&content)?,
		};
		let leaders = self.leaders_from_roster(&entries);
		if leaders.is_empty() {
			return Err(RosterError::Empty);
		}
		Ok(leaders)
	}

	/// Turns survey answers into leaders. Colleague names are resolved
	/// against the leaders in the same roster.
	pub fn leaders_from_roster(&self, entries: &[RosterEntry]) -> Vec<Leader> {
		let leading: Vec<&RosterEntry> = entries.iter().filter(|e| e.wants_to_lead).collect();
		let names: Vec<String> = leading.iter().map(|e| e.name.trim().to_string()).collect();

		leading
			.iter()
			.zip(&names)
			.map(|(entry, name)| {
				let mut leader = Leader::new(name.clone(), entry.experience);
				for (rank, choice) in entry.choices.iter().take(3).enumerate() {
					let choice = choice.trim();
					if choice.is_empty() || leader.group_affinities.contains_key(choice) {
						continue;
					}
					if let Some(affinity) = Affinity::from_rank(rank) {
						leader.group_affinities.insert(choice.to_string(), affinity);
					}
				}
				if let Some(text) = &entry.preferred {
					leader.preferred_leaders = self.resolve_names(name, text, &names);
				}
				if let Some(text) = &entry.unwanted {
					leader.unwanted_leaders = self.resolve_names(name, text, &names);
				}
				leader
			})
			.collect()
	}

	/// Splits on `,` `;` and the words "en" and "and".
	pub fn split_names<'a>(&self, text: &'a str) -> Vec<&'a str> {
		self.separator
			.split(text)
			.map(str::trim)
			.filter(|name| !name.is_empty())
			.collect()
	}

	fn resolve_names(&self, owner: &str, text: &str, known: &[String]) -> Vec<String> {
		let mut resolved = Vec::new();
		let mut seen = HashSet::new();
		let mut unmatched = Vec::new();

		for name in self.split_names(text) {
			let found = known
				.iter()
				.find(|k| k.as_str() == name)
				.or_else(|| {
					let lowered = name.to_lowercase();
					known.iter().find(|k| k.to_lowercase() == lowered)
				});
			match found {
				Some(k) if seen.insert(k.as_str()) => resolved.push(k.clone()),
				Some(_) => {}
				None => unmatched.push(name),
			}
		}

		if !unmatched.is_empty() {
			warn!(leader = owner, ?unmatched, "Could not match colleague names");
		}
		debug!(leader = owner, ?resolved, "Resolved colleague names");
		resolved
	}
}

/// Reads a survey export with one answer per row.
///
/// Yes/no questions count as yes only for "Ja". Colleague names are only
/// taken when the matching question was answered yes.
pub fn survey_entries(content: &str) -> Result<Vec<RosterEntry>, RosterError> {
	let mut reader = csv::ReaderBuilder::new()
		.flexible(true)
		.trim(csv::Trim::All)
		.from_reader(content.as_bytes());
	let headers = reader.headers()?.clone();
	let column = |name: &str| headers.iter().position(|header| header == name);
	let required = |name: &'static str| column(name).ok_or(RosterError::MissingColumn(name));

	let name_column = required(NAME)?;
	let lead_column = required(WANTS_TO_LEAD)?;
	let choice_columns: Vec<Option<usize>> = CHOICES.iter().map(|c| column(c)).collect();
	let experience_column = column(EXPERIENCE);
	let preferred_column = column(HAS_PREFERRED);
	let unwanted_column = column(HAS_UNWANTED);

	let mut entries = Vec::new();
	for record in reader.records() {
		let record = record?;
		let field = |column: Option<usize>| column.and_then(|c| record.get(c)).unwrap_or("");
		let answered_yes = |column: Option<usize>| field(column).eq_ignore_ascii_case("ja");
		let names_if = |question: Option<usize>, names: usize| {
			Some(field(Some(names)))
				.filter(|text| answered_yes(question) && !text.is_empty())
				.map(str::to_string)
		};

		let name = field(Some(name_column)).to_string();
		let experience = match field(experience_column) {
			"" => 0,
			raw => raw.parse().map_err(|_| RosterError::Experience {
				name: name.clone(),
				value: raw.to_string(),
			})?,
		};

		entries.push(RosterEntry {
			wants_to_lead: answered_yes(Some(lead_column)),
			choices: choice_columns.iter().map(|&c| field(c).to_string()).collect(),
			experience,
			preferred: names_if(preferred_column, PREFERRED_NAMES_COLUMN),
			unwanted: names_if(unwanted_column, UNWANTED_NAMES_COLUMN),
			name,
		});
	}
	Ok(entries)
}

/// Roster used when no usable roster file is available.
pub fn builtin_leaders() -> Vec<Leader> {
	use Affinity::{High, Low, Medium};

	vec![
		Leader::new("Lars", 0).with_affinity("Speelclub", High),
		Leader::new("Zeger", 1)
			.with_affinity("Rakkers", High)
			.with_affinity("Speelclub", Medium)
			.with_affinity("Kerels", Low)
			.with_unwanted(&["Lars", "SenneV"]),
		Leader::new("Simon Souvereyns", 1)
			.with_affinity("Speelclub", High)
			.with_affinity("Rakkers", Medium)
			.with_preferred(&["Tom", "Jasper Ceunen", "Lowie"])
			.with_unwanted(&["Lars", "Simon van Straaten", "SenneV"]),
		Leader::new("Tom", 1)
			.with_affinity("Speelclub", High)
			.with_affinity("Rakkers", Medium)
			.with_preferred(&["Simon van Straaten", "Jasper Ceunen"])
			.with_unwanted(&["Jasper Neyens", "SenneV"]),
		Leader::new("Emiel", 1)
			.with_affinity("Kerels", High)
			.with_affinity("Speelclub", Medium)
			.with_preferred(&["Jasper Ceunen", "Jef", "Mats"])
			.with_unwanted(&["Stan", "Simon van Straaten", "SenneV", "Lars"]),
		Leader::new("Jasper Ceunen", 1)
			.with_affinity("Kerels", High)
			.with_affinity("Rakkers", Medium)
			.with_unwanted(&["Stan", "SenneV"]),
		Leader::new("Jasper Neyens", 1)
			.with_affinity("Kerels", High)
			.with_affinity("Speelclub", Medium)
			.with_affinity("Rakkers", Low)
			.with_preferred(&["Jasper Ceunen", "Emiel"]),
		Leader::new("Simon van Straaten", 1)
			.with_affinity("Aspiranten", High)
			.with_preferred(&["Jef"])
			.with_unwanted(&["SenneV", "Stan"]),
		Leader::new("Lowie", 1)
			.with_affinity("Speelclub", High)
			.with_affinity("Rakkers", Medium)
			.with_preferred(&["Jasper Ceunen", "Simon Souvereyns", "Mats"])
			.with_unwanted(&["Jasper Neyens", "Lars", "Simon van Straaten", "SenneV"]),
		Leader::new("Jef", 1)
			.with_affinity("Aspiranten", High)
			.with_preferred(&["Simon van Straaten"])
			.with_unwanted(&["Stan", "Jasper Neyens"]),
		Leader::new("Brent", 0)
			.with_affinity("Speelclub", High)
			.with_affinity("Rakkers", Medium)
			.with_affinity("Toppers", Low),
		Leader::new("Mats", 0)
			.with_affinity("Speelclub", High)
			.with_affinity("Rakkers", Medium)
			.with_affinity("Toppers", Low),
		Leader::new("SenneVG", 0)
			.with_affinity("Rakkers", High)
			.with_affinity("Toppers", Medium)
			.with_affinity("Speelclub", Low),
		Leader::new("Stan", 0)
			.with_affinity("Rakkers", High)
			.with_affinity("Toppers", Medium)
			.with_affinity("Kerels", Low)
			.with_preferred(&["SenneVG"])
			.with_unwanted(&["Jef", "Simon van Straaten"]),
		Leader::new("SenneV", 0)
			.with_affinity("Speelclub", High)
			.with_affinity("Rakkers", Medium)
			.with_affinity("Toppers", Low),
	]
}

#[cfg(test)]
mod tests {
	use super::*;
	use schedule_types::validate_schedule;
	use std::io::Write;

	fn demo(path: Option<PathBuf>) -> DemoData {
		DemoData::new(path).unwrap()
	}

	fn entry(name: &str) -> RosterEntry {
		RosterEntry {
			name: name.to_string(),
			wants_to_lead: true,
			choices: Vec::new(),
			experience: 0,
			preferred: None,
			unwanted: None,
		}
	}

	#[test]
	fn test_split_names() {
		let demo = demo(None);
		assert_eq!(
			demo.split_names("Tom, Jef en Lars; Mats and Stan"),
			vec!["Tom", "Jef", "Lars", "Mats", "Stan"]
		);
		// Only whole words separate names
		assert_eq!(demo.split_names("Senne, Brent"), vec!["Senne", "Brent"]);
		assert!(demo.split_names(" , ; ").is_empty());
	}

	#[test]
	fn test_roster_entries_become_leaders() {
		let demo = demo(None);
		let mut anke = entry("Anke ");
		anke.experience = 2;
		anke.choices = vec!["Kerels".into(), " ".into(), "Kerels".into()];
		anke.preferred = Some("bram en Onbekend".into());
		let mut bram = entry("Bram");
		bram.choices = vec!["Rakkers".into(), "Toppers".into(), "Kerels".into(), "Speelclub".into()];
		bram.unwanted = Some("Anke, Anke".into());
		let mut quitter = entry("Cas");
		quitter.wants_to_lead = false;

		let leaders = demo.leaders_from_roster(&[anke, bram, quitter]);

		assert_eq!(leaders.len(), 2);
		let anke = &leaders[0];
		assert_eq!(anke.name, "Anke");
		assert_eq!(anke.experience, 2);
		assert_eq!(anke.group_affinities.len(), 1);
		assert_eq!(anke.affinity_for("Kerels"), Some(Affinity::High));
		assert_eq!(anke.preferred_leaders, vec!["Bram"]);

		let bram = &leaders[1];
		assert_eq!(bram.affinity_for("Rakkers"), Some(Affinity::High));
		assert_eq!(bram.affinity_for("Toppers"), Some(Affinity::Medium));
		assert_eq!(bram.affinity_for("Kerels"), Some(Affinity::Low));
		assert_eq!(bram.affinity_for("Speelclub"), None);
		assert_eq!(bram.unwanted_leaders, vec!["Anke"]);
	}

	#[tokio::test]
	async fn test_builtin_demo_is_valid() {
		let schedule = demo(None).generate().await;

		assert_eq!(schedule.groups.len(), 5);
		assert_eq!(schedule.leaders.len(), builtin_leaders().len());
		assert!(validate_schedule(&schedule).is_ok());
		// Every colleague reference names a leader on the roster
		for leader in &schedule.leaders {
			for name in leader.preferred_leaders.iter().chain(&leader.unwanted_leaders) {
				assert!(schedule.leader(name).is_some(), "unknown colleague {}", name);
			}
		}
	}

	#[tokio::test]
	async fn test_roster_file_is_loaded() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		write!(
			file,
			r#"[
				{{ "name": "Anke", "choices": ["Kerels"], "experience": 1, "preferred": "Bram" }},
				{{ "name": "Bram", "choices": ["Aspiranten", "Kerels"] }},
				{{ "name": "Cas", "wants_to_lead": false }}
			]"#
		)
		.unwrap();

		let schedule = demo(Some(file.path().to_path_buf())).generate().await;

		assert_eq!(schedule.leaders.len(), 2);
		assert_eq!(schedule.leader("Anke").unwrap().preferred_leaders, vec!["Bram"]);
		assert!(schedule.leader("Cas").is_none());
	}

	#[test]
	fn test_colleague_names_match_ignoring_case() {
		let demo = demo(None);
		let mut anke = entry("Anke");
		anke.preferred = Some("émile; ANKE".into());

		let leaders = demo.leaders_from_roster(&[anke, entry("Émile")]);

		assert_eq!(leaders[0].preferred_leaders, vec!["Émile", "Anke"]);
	}

	const SURVEY_HEADER: &str = "Tijdstempel,Naam,Ik wil volgend jaar in leiding staan,\
		Mijn eerste keuze van groep,Mijn tweede keuze van groep,Mijn derde keuze van groep,\
		Is er een leider waar je graag mee in leiding zou staan?,Met wie?,\
		Is er een leider waar je niet graag mee in leiding zou staan?,Met wie niet?,experience";

	#[tokio::test]
	async fn test_survey_file_is_loaded() {
		let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
		writeln!(file, "{}", SURVEY_HEADER).unwrap();
		writeln!(file, "2024-05-01,Anke,Ja,Kerels,Aspiranten,,Ja,\"Bram en émile\",Nee,Cas,2").unwrap();
		writeln!(file, "2024-05-01,Bram,ja,Aspiranten,,,Nee,Anke,Ja,Anke,").unwrap();
		writeln!(file, "2024-05-02, Émile ,Ja,Rakkers,Rakkers,Toppers,Nee,,Nee,,0").unwrap();
		writeln!(file, "2024-05-02,Cas,Nee,Kerels,,,Nee,,Nee,,").unwrap();

		let schedule = demo(Some(file.path().to_path_buf())).generate().await;

		assert_eq!(schedule.leaders.len(), 3);
		assert!(schedule.leader("Cas").is_none());

		let anke = schedule.leader("Anke").unwrap();
		assert_eq!(anke.experience, 2);
		assert_eq!(anke.affinity_for("Kerels"), Some(Affinity::High));
		assert_eq!(anke.affinity_for("Aspiranten"), Some(Affinity::Medium));
		assert_eq!(anke.preferred_leaders, vec!["Bram", "Émile"]);
		// The unwanted names only count after a "Ja"
		assert!(anke.unwanted_leaders.is_empty());

		let bram = schedule.leader("Bram").unwrap();
		assert!(bram.preferred_leaders.is_empty());
		assert_eq!(bram.unwanted_leaders, vec!["Anke"]);

		let emile = schedule.leader("Émile").unwrap();
		assert_eq!(emile.group_affinities.len(), 2);
		assert_eq!(emile.affinity_for("Toppers"), Some(Affinity::Low));
	}

	#[test]
	fn test_survey_errors() {
		assert!(matches!(
			survey_entries("Naam,experience\nAnke,1\n"),
			Err(RosterError::MissingColumn(WANTS_TO_LEAD))
		));
		assert!(matches!(
			survey_entries("Naam,Ik wil volgend jaar in leiding staan,experience\nAnke,Ja,veel\n"),
			Err(RosterError::Experience { .. })
		));
	}

	#[tokio::test]
	async fn test_unusable_roster_falls_back() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		write!(file, "not json").unwrap();

		let broken = demo(Some(file.path().to_path_buf())).generate().await;
		let missing = demo(Some(PathBuf::from("/nonexistent/roster.json")))
			.generate()
			.await;

		assert_eq!(broken.leaders.len(), builtin_leaders().len());
		assert_eq!(missing.leaders.len(), builtin_leaders().len());
	}
}
