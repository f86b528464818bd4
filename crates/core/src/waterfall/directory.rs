//! Curated organization name to domain directory.
//!
//! Entries are consulted in declared order: configured entries first, then
//! the built-in list. Within a pass the first matching entry wins, and the
//! passes run from strictest to loosest (exact, prefix, token).

use serde::Serialize;

use super::config::DirectoryEntry;
use crate::query::normalize_organization;

/// Built-in mappings for well-known financial, consulting and technology
/// organizations whose mail domain differs from their name.
const BUILTIN: &[(&str, &str)] = &[
    // Banks
    ("goldman sachs", "gs.com"),
    ("goldman", "gs.com"),
    ("gs", "gs.com"),
    ("jp morgan", "jpmorgan.com"),
    ("jpmorgan", "jpmorgan.com"),
    ("morgan stanley", "morganstanley.com"),
    ("barclays", "barclays.com"),
    ("barclays bank", "barclays.com"),
    ("barclays investment", "barclays.com"),
    ("hsbc", "hsbc.com"),
    ("deutsche bank", "db.com"),
    ("ubs", "ubs.com"),
    ("credit suisse", "credit-suisse.com"),
    ("citigroup", "citi.com"),
    ("citi", "citi.com"),
    ("bnp paribas", "bnpparibas.com"),
    ("bnp", "bnpparibas.com"),
    ("societe generale", "societegenerale.com"),
    ("socgen", "societegenerale.com"),
    ("nomura", "nomura.com"),
    ("mizuho", "mizuho-fg.com"),
    ("wells fargo", "wellsfargo.com"),
    ("bank of america", "bankofamerica.com"),
    ("bofa", "bankofamerica.com"),
    ("merrill lynch", "ml.com"),
    ("lazard", "lazard.com"),
    ("rothschild", "rothschildandco.com"),
    ("evercore", "evercore.com"),
    ("jefferies", "jefferies.com"),
    ("piper sandler", "pipersandler.com"),
    ("raymond james", "raymondjames.com"),
    ("cowen", "cowen.com"),
    ("stifel", "stifel.com"),
    // Asset managers, funds and investors
    ("blackrock", "blackrock.com"),
    ("vanguard", "vanguard.com"),
    ("fidelity", "fidelity.com"),
    ("state street", "statestreet.com"),
    ("pimco", "pimco.com"),
    ("t rowe price", "troweprice.com"),
    ("invesco", "invesco.com"),
    ("franklin templeton", "franklintempleton.com"),
    ("capital group", "capitalgroup.com"),
    ("wellington management", "wellington.com"),
    ("wellington", "wellington.com"),
    ("dimensional", "dimensional.com"),
    ("dfa", "dimensional.com"),
    ("aberdeen", "aberdeengroup.com"),
    ("abrdn", "abrdn.com"),
    ("schroders", "schroders.com"),
    ("schroder", "schroders.com"),
    ("man group", "man.com"),
    ("man investments", "man.com"),
    ("brevan howard", "brevanhoward.com"),
    ("paulson", "paulsonandc.com"),
    ("aqr", "aqr.com"),
    ("two sigma", "twosigma.com"),
    ("renaissance", "rentec.com"),
    ("renaissance technologies", "rentec.com"),
    ("citadel", "citadel.com"),
    ("millennium", "mlp.com"),
    ("point72", "point72.com"),
    ("bridgewater", "bridgewater.com"),
    ("tudor", "tudor.com"),
    ("third point", "thirdpointllc.com"),
    ("elliott management", "elliottmgmt.com"),
    ("blue owl", "blueowl.com"),
    ("ares management", "aresmgmt.com"),
    ("ares", "aresmgmt.com"),
    ("apollo", "apollo.com"),
    ("apollo global", "apollo.com"),
    ("carlyle", "carlyle.com"),
    ("kkr", "kkr.com"),
    ("blackstone", "blackstone.com"),
    ("tpg", "tpg.com"),
    ("warburg pincus", "warburgpincus.com"),
    ("advent international", "adventinternational.com"),
    ("bain capital", "baincapital.com"),
    ("general atlantic", "generalatlantic.com"),
    ("tiger global", "tigerglobal.com"),
    ("sequoia", "sequoiacap.com"),
    ("andreessen horowitz", "a16z.com"),
    ("a16z", "a16z.com"),
    ("coatue", "coatue.com"),
    ("insight partners", "insightpartners.com"),
    ("softbank", "softbank.com"),
    ("temasek", "temasek.com"),
    ("gic", "gic.com.sg"),
    ("norges bank", "norges-bank.no"),
    ("canada pension", "cppinvestments.com"),
    ("cpp", "cppinvestments.com"),
    ("ontario teachers", "otpp.com"),
    ("otpp", "otpp.com"),
    ("calpers", "calpers.ca.gov"),
    ("calstrs", "calstrs.com"),
    // Brokers and exchanges
    ("interactive brokers", "interactivebrokers.com"),
    ("ibkr", "interactivebrokers.com"),
    ("charles schwab", "schwab.com"),
    ("schwab", "schwab.com"),
    ("td ameritrade", "tdameritrade.com"),
    ("etrade", "etrade.com"),
    ("robinhood", "robinhood.com"),
    ("coinbase", "coinbase.com"),
    // Technology and consulting
    ("google", "google.com"),
    ("alphabet", "abc.xyz"),
    ("microsoft", "microsoft.com"),
    ("apple", "apple.com"),
    ("amazon", "amazon.com"),
    ("meta", "meta.com"),
    ("facebook", "meta.com"),
    ("netflix", "netflix.com"),
    ("tesla", "tesla.com"),
    ("nvidia", "nvidia.com"),
    ("ibm", "ibm.com"),
    ("oracle", "oracle.com"),
    ("salesforce", "salesforce.com"),
    ("mckinsey", "mckinsey.com"),
    ("bain", "bain.com"),
    ("bcg", "bcg.com"),
    ("boston consulting", "bcg.com"),
    ("deloitte", "deloitte.com"),
    ("kpmg", "kpmg.com"),
    ("pwc", "pwc.com"),
    ("ey", "ey.com"),
    ("ernst young", "ey.com"),
];

/// How a directory lookup matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Prefix,
    Token,
}

/// A successful directory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryMatch {
    pub domain: String,
    pub kind: MatchKind,
}

/// Ordered list of `(normalized name, domain)` pairs.
#[derive(Debug, Clone)]
pub struct DomainDirectory {
    entries: Vec<(String, String)>,
}

impl Default for DomainDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DomainDirectory {
    /// The built-in directory alone.
    pub fn builtin() -> Self {
        Self::with_entries(&[])
    }

    /// Configured entries ahead of the built-in directory.
    pub fn with_entries(extra: &[DirectoryEntry]) -> Self {
        let configured = extra
            .iter()
            .map(|e| (canonical(&e.name), e.domain.trim().to_lowercase()))
            .filter(|(name, domain)| !name.is_empty() && !domain.is_empty());
        let builtin = BUILTIN
            .iter()
            .map(|(name, domain)| (name.to_string(), domain.to_string()));

        Self {
            entries: configured.chain(builtin).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look an organization up, trying its name as given and with legal
    /// suffixes removed.
    pub fn lookup(&self, organization: &str) -> Option<DirectoryMatch> {
        let mut names = vec![canonical(organization)];
        let normalized = canonical(&normalize_organization(organization));
        if normalized != names[0] {
            names.push(normalized);
        }
        names.retain(|n| !n.is_empty());
        if names.is_empty() {
            return None;
        }

        let passes: [(MatchKind, fn(&str, &str) -> bool); 3] = [
            (MatchKind::Exact, |name, key| name == key),
            (MatchKind::Prefix, prefix_match),
            (MatchKind::Token, token_match),
        ];

        for (kind, matches) in passes {
            for (key, domain) in &self.entries {
                if names.iter().any(|name| matches(name, key)) {
                    return Some(DirectoryMatch {
                        domain: domain.clone(),
                        kind,
                    });
                }
            }
        }
        None
    }
}

/// Lowercase, punctuation folded to spaces, whitespace collapsed.
fn canonical(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// One side is a whole-word prefix of the other.
fn prefix_match(name: &str, key: &str) -> bool {
    fn word_prefix(long: &str, short: &str) -> bool {
        long.len() > short.len()
            && long.starts_with(short)
            && long[short.len()..].starts_with(' ')
    }
    word_prefix(name, key) || word_prefix(key, name)
}

/// Every word of the name appears among the key's words.
fn token_match(name: &str, key: &str) -> bool {
    let key_tokens: Vec<&str> = key.split(' ').collect();
    name.split(' ').all(|t| key_tokens.contains(&t))
}
