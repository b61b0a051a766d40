//! Question analysis: terms, anchors, kind, intent, event tags, expansions.

use once_cell::sync::Lazy;
use policyqa_extract::{EventTag, ExtractQuery, QuestionKind};
use regex::Regex;
use serde::Serialize;

/// Terms kept after sorting by length.
const MAX_TERMS: usize = 3;

/// Question words and request endings that never identify a topic.
const STOPWORDS: &[&str] = &[
    "며칠", "며칠이야", "며칠인가요", "며칠이에요", "몇일", "알려줘", "알려주세요", "알려줄래",
    "뭐야", "뭐예요", "무엇", "무엇인가요", "어떻게", "어떻게요", "얼마나", "얼마", "얼마야",
    "관련", "대해", "대한", "대해서", "있나요", "있어", "있어요", "해줘", "어떤", "어떠한",
    "궁금", "궁금해요", "주세요", "인가요", "경우", "되나요", "되요", "돼요", "가능", "가능한가요",
    "what", "how", "the", "is", "are",
];

/// Generic domain filler: never an anchor, attenuated in ranking.
const FILLER_TERMS: &[&str] = &["신청", "절차", "기준", "방법", "규정", "내용", "안내", "적용"];

/// Curated search phrases for compound terms that rarely appear verbatim.
const KNOWN_EXPANSIONS: &[(&str, &[&str])] = &[
    ("경조휴가", &["경조사", "경조 휴가", "경조사 휴가"]),
    ("기타휴가", &["기타 휴가", "특별휴가", "공가", "병가"]),
    ("기념휴가", &["기념일", "기념 휴가", "창립기념일"]),
    ("프로젝트수당", &["프로젝트 수당", "PM 수당", "프로젝트 리더"]),
    ("경조화환", &["화환", "조화", "근조기", "경조 화환"]),
];

const LEAVE_SUFFIX: &str = "휴가";

static TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]{2,}").unwrap());

static LIST_INDICATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"목록|리스트|종류|전체|모두|뭐가\s*있|나열").unwrap());
static CATEGORY_NOUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"휴가|수당|경조|항목|유형").unwrap());
static CRITERIA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"기준|조건|대상|첨부|서류|절차|정의").unwrap());
static DAYS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"며칠|몇\s*일|일수|기간|몇\s*시간").unwrap());
static MONEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"수당|금액|얼마|비용|지급액|\d\s*원").unwrap());

static FLOWER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"화환|조화|근조|꽃").unwrap());
static FAMILY_EVENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"경조|조사|부고|장례|결혼|출산").unwrap());
static LEAVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"휴가|연차|반차").unwrap());
static ALLOWANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"수당|지급|금액|비용|얼마").unwrap());

static EVENT_RULES: Lazy<Vec<(EventTag, Regex)>> = Lazy::new(|| {
    [
        (EventTag::Spouse, r"배우자|남편|아내"),
        (EventTag::Parent, r"부모|부친|모친|아버지|어머니"),
        (EventTag::Child, r"자녀|아들|딸"),
        (EventTag::Sibling, r"형제|자매"),
        (EventTag::Grandparent, r"조부모|할아버지|할머니"),
        (EventTag::Family, r"가족|경조|친족"),
        (EventTag::Marriage, r"결혼|혼인"),
        (EventTag::Bereavement, r"사망|별세|조의|부고"),
        (EventTag::Childbirth, r"출산|분만"),
        (EventTag::ReserveDuty, r"예비군|민방위"),
        (EventTag::SickLeave, r"병가|질병"),
        (EventTag::OfficialLeave, r"공가|공무"),
    ]
    .into_iter()
    .map(|(tag, pattern)| (tag, Regex::new(pattern).unwrap()))
    .collect()
});

/// Coarse topic of a question, used to frame summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Flower,
    FamilyEvent,
    Leave,
    Allowance,
    General,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Flower => "경조화환",
            Intent::FamilyEvent => "경조사",
            Intent::Leave => "휴가",
            Intent::Allowance => "수당·지급",
            Intent::General => "일반 문의",
        }
    }
}

/// Up to three distinct terms, longest first.
pub fn tokenize(question: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for m in TERM_RE.find_iter(question) {
        let term = m.as_str().to_lowercase();
        if STOPWORDS.contains(&term.as_str()) || terms.contains(&term) {
            continue;
        }
        terms.push(term);
    }
    terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    terms.truncate(MAX_TERMS);
    terms
}

pub fn is_filler_term(term: &str) -> bool {
    FILLER_TERMS.contains(&term)
}

/// Terms minus generic filler, or all terms if nothing else remains.
pub fn pick_anchors(terms: &[String]) -> Vec<String> {
    let anchors: Vec<String> = terms
        .iter()
        .filter(|t| !is_filler_term(t))
        .cloned()
        .collect();
    if anchors.is_empty() {
        terms.to_vec()
    } else {
        anchors
    }
}

pub fn classify_question_kind(question: &str) -> QuestionKind {
    if LIST_INDICATOR_RE.is_match(question) && CATEGORY_NOUN_RE.is_match(question) {
        QuestionKind::List
    } else if CRITERIA_RE.is_match(question) {
        QuestionKind::Criteria
    } else if DAYS_RE.is_match(question) {
        QuestionKind::Days
    } else {
        QuestionKind::Unknown
    }
}

/// First matching rule wins.
pub fn infer_intent(question: &str) -> Intent {
    let rules: [(&Lazy<Regex>, Intent); 4] = [
        (&FLOWER_RE, Intent::Flower),
        (&FAMILY_EVENT_RE, Intent::FamilyEvent),
        (&LEAVE_RE, Intent::Leave),
        (&ALLOWANCE_RE, Intent::Allowance),
    ];
    rules
        .iter()
        .find(|(re, _)| re.is_match(question))
        .map_or(Intent::General, |(_, intent)| *intent)
}

/// Every event tag whose vocabulary appears in the question.
pub fn normalize_event_keywords(question: &str) -> Vec<EventTag> {
    EVENT_RULES
        .iter()
        .filter(|(_, re)| re.is_match(question))
        .map(|(tag, _)| *tag)
        .collect()
}

pub fn is_day_question(question: &str) -> bool {
    DAYS_RE.is_match(question)
}

pub fn is_money_question(question: &str) -> bool {
    MONEY_RE.is_match(question)
}

/// Retrieval variants: the raw and collapsed question, curated phrases for
/// known compounds, and spaced forms of leave terms.
pub fn expand_query_terms(question: &str, terms: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: String| {
        let s = s.trim().to_string();
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    };

    push(question.to_string());
    push(question.split_whitespace().collect::<Vec<_>>().join(" "));

    let compact: String = question.chars().filter(|c| !c.is_whitespace()).collect();
    for (compound, phrases) in KNOWN_EXPANSIONS {
        if compact.contains(compound) {
            for phrase in *phrases {
                push(phrase.to_string());
            }
        }
    }

    for term in terms {
        if let Some(stem) = term.strip_suffix(LEAVE_SUFFIX) {
            if !stem.is_empty() {
                push(format!("{} {}", stem, LEAVE_SUFFIX));
                push(LEAVE_SUFFIX.to_string());
            }
        }
    }
    out
}

/// Everything the pipeline stages need to know about one question.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPlan {
    pub question: String,
    pub terms: Vec<String>,
    pub anchors: Vec<String>,
    pub kind: QuestionKind,
    pub intent: Intent,
    pub event_tags: Vec<EventTag>,
    pub expansions: Vec<String>,
    pub day_question: bool,
    pub money_question: bool,
}

impl QueryPlan {
    pub fn analyze(question: &str) -> Self {
        let question = question.trim();
        let terms = tokenize(question);
        let anchors = pick_anchors(&terms);
        let expansions = expand_query_terms(question, &terms);
        Self {
            question: question.to_string(),
            kind: classify_question_kind(question),
            intent: infer_intent(question),
            event_tags: normalize_event_keywords(question),
            day_question: is_day_question(question),
            money_question: is_money_question(question),
            terms,
            anchors,
            expansions,
        }
    }

    pub fn extract_query(&self) -> ExtractQuery {
        ExtractQuery {
            question: self.question.clone(),
            kind: self.kind,
            tokens: self.terms.clone(),
            event_tags: self.event_tags.clone(),
        }
    }
}
