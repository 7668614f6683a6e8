//! Stage prompt templates
//!
//! Search and sentiment templates reference entity variables only. Extraction
//! templates additionally reference `{SEARCH_REPORT}` and `{SENTIMENT_REPORT}`,
//! bound after the first two stages complete.

use crate::data::EntityKind;

/// The three stage templates for one entity kind
#[derive(Debug, Clone, Copy)]
pub struct TemplateSet {
    pub search: &'static str,
    pub sentiment: &'static str,
    pub extraction: &'static str,
}

impl TemplateSet {
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::National => Self {
                search: NATIONAL_SEARCH,
                sentiment: NATIONAL_SENTIMENT,
                extraction: NATIONAL_EXTRACTION,
            },
            EntityKind::Regional => Self {
                search: REGIONAL_SEARCH,
                sentiment: REGIONAL_SENTIMENT,
                extraction: REGIONAL_EXTRACTION,
            },
            EntityKind::Block => Self {
                search: BLOCK_SEARCH,
                sentiment: BLOCK_SENTIMENT,
                extraction: BLOCK_EXTRACTION,
            },
        }
    }
}

pub const NATIONAL_SEARCH: &str = r#"
You are a Data Analyst specializing in Japanese electoral research.

Analysis Date: {TODAY}
Subject: 51st Japanese House of Representatives Election (2026)

Task: Analyze national election conditions using news and polling data.

Required Analysis:
1. Cabinet Approval Rating
   - Current approval percentage from recent surveys
   - Trend direction (rising/falling/stable)

2. Party Support Rates
   - Report support percentages for: {PARTY_LIST}
   - Include data sources when available

3. Key Policy Issues
   - Major topics influencing voter decisions
   - Party positions on each issue

4. National Trend Assessment
   - Overall momentum: ruling coalition vs opposition
   - Supporting data and recent developments

5. Competitive Districts
   - Districts with close races expected
   - Notable candidates

Analysis Guidelines:
- Provide substantive analysis for all sections
- Use historical patterns and regional characteristics when recent data is limited
- Prioritize objective data from news sources and surveys
- Focus on most recent available information
"#;

pub const NATIONAL_SENTIMENT: &str = r#"
You are a Data Analyst examining social media sentiment.

Analysis Date: {TODAY}
Subject: 51st Japanese House of Representatives Election (2026)

Task: Analyze election-related trends on X (Twitter).

Required Analysis:
1. Party Engagement Metrics
   - Parties to analyze: {PARTY_LIST}
   - Mention frequency and engagement trends

2. Trending Politicians
   - Politicians generating discussion
   - Sentiment ratio (positive/negative)

3. Hashtag Analysis
   - Popular election-related hashtags
   - Emerging trends

4. Voter Concerns
   - Policy topics under active discussion
   - Areas of criticism or controversy

5. Party Sentiment Summary
   - Positive/negative ratio per party
   - Main praise points and criticisms

Important Considerations:
- Social media does not represent all voters
- Consider potential bot activity and coordinated campaigns
- Note influencer effects on discourse
- Recognize urban/rural participation bias

Output Requirements:
- Include specific metrics where available
- Maintain analytical objectivity
- Note social media sampling limitations
"#;

pub const NATIONAL_EXTRACTION: &str = r#"
You are a Data Analyst. Synthesize the following reports into structured JSON.

News and Survey Data:
{SEARCH_REPORT}

Social Media Analysis:
{SENTIMENT_REPORT}

Synthesis Rules:
1. Integrate information from both sources
2. When sources conflict, prioritize news/survey data
3. Use social media insights as supplementary context
4. Apply reasonable estimates when specific figures are unavailable

Party ID Reference:
- Liberal Democratic Party → "ldp"
- Chudou Reform Coalition → "chudou"
- Japan Innovation Party → "ishin"
- Democratic Party for the People → "dpfp"
- Sanseito → "sanseito"
- Japanese Communist Party → "jcp"
- Reiwa Shinsengumi → "reiwa"
- Social Democratic Party → "shamin"
- Independent → "independent"
- Other → "other"

Seat Constraints:
- Single-member districts: 289 total
- Proportional representation: 176 total
- Total seats: 465
- Majority threshold: 233

Output JSON only, following this schema:

{
  "cabinet_approval": number (percentage),
  "party_support": { "partyId": percentage },
  "key_issues": [
    { "issue": "name", "importance": "high/medium/low", "favorable_to": "partyId" }
  ],
  "national_trend": "ruling_advantage/opposition_advantage/close",
  "seat_projection": { "partyId": projected_seats },
  "district_seats": { "partyId": district_seat_count },
  "proportional_seats": { "partyId": proportional_seat_count },
  "analysis_summary": "Summary in Japanese (approximately 200 characters)"
}
"#;

pub const REGIONAL_SEARCH: &str = r#"
You are a Data Analyst specializing in Japanese electoral research.

Analysis Date: {TODAY}
Subject: 2026 House of Representatives Election
Region: {PREFECTURE} ({DISTRICT_COUNT} single-member districts)

District List:
{DISTRICT_LIST}

Candidate Information:
{CANDIDATES_SECTION}

Task: Analyze election conditions in {PREFECTURE}.

Required Analysis:
1. District-by-District Assessment
   - Leading candidates/parties per district
   - Competitiveness level
   - Changes from previous election

2. Regional Characteristics
   - Political tendencies in {PREFECTURE}
   - Urban vs rural differences
   - Key support bases

3. Local Issues
   - Priority concerns for local voters
   - Differences from national issues

4. Key Factors
   - Competitive districts
   - Notable candidates
   - Decisive factors for outcomes

Analysis Guidelines:
- Cover ALL districts (no omissions)
- Provide substantive analysis for each district
- Use regional characteristics and historical patterns when recent data is limited
- Include predicted winner and confidence level (high/medium/low) for each district
"#;

pub const REGIONAL_SENTIMENT: &str = r#"
You are a Data Analyst examining social media sentiment.

Analysis Date: {TODAY}
Subject: 2026 House of Representatives Election
Region: {PREFECTURE} ({DISTRICT_COUNT} single-member districts)

District List:
{DISTRICT_LIST}

Candidate Information:
{CANDIDATES_SECTION}

Task: Analyze X (Twitter) trends related to {PREFECTURE} elections.

Required Analysis:
1. Politician Visibility in {PREFECTURE}
   - Follower counts, engagement rates
   - Candidates generating discussion

2. District-Specific Discussion
   - Topics being debated per district
   - Reactions to candidates

3. Local Issue Sentiment
   - Regional concerns trending on social media
   - Voter complaints and demands

4. Candidate/Party Reactions
   - Positive/negative ratios
   - Main criticism points and praise

Important Considerations:
- Social media does not represent all voters
- Recognize urban/rural participation bias
- Consider potential bot activity and coordinated campaigns

Output Requirements:
- Reference each district
- Analyze trends objectively
- Note social media sampling limitations
"#;

pub const REGIONAL_EXTRACTION: &str = r#"
You are a Data Analyst. Generate prediction JSON for {PREFECTURE}.

News and Survey Data:
{SEARCH_REPORT}

Social Media Analysis:
{SENTIMENT_REPORT}

Critical Constraints:
- {PREFECTURE} has exactly {DISTRICT_COUNT} single-member districts
- Districts: {DISTRICT_LIST}
- Output ONLY these {DISTRICT_COUNT} districts (no more, no less)

Party ID Reference:
- Liberal Democratic Party → "ldp"
- Chudou Reform Coalition → "chudou"
- Japan Innovation Party → "ishin"
- Democratic Party for the People → "dpfp"
- Sanseito → "sanseito"
- Japanese Communist Party → "jcp"
- Reiwa Shinsengumi → "reiwa"
- Social Democratic Party → "shamin"
- Independent → "independent"
- Other → "other"

Synthesis Rules:
1. Integrate information from both sources
2. When sources conflict, prioritize news/survey data
3. Use social media as supplementary context
4. Confidence levels based on data clarity:
   - high: Clear advantage, multiple data points agree
   - medium: Slight advantage but uncertainty exists
   - low: Close race or limited information

Output JSON only:

{
  "prefecture_id": "{PREFECTURE_ID}",
  "prefecture_name": "{PREFECTURE}",
  "districts": [
    {
      "district_id": "prefecture-number",
      "district_name": "Prefecture District X",
      "winner_party": "partyId",
      "confidence": "high/medium/low",
      "analysis": "Brief analysis (approx 50 chars)",
      "candidates": [
        { "name": "Candidate Name", "party": "partyId", "vote_share_min": min%, "vote_share_max": max% }
      ]
    }
  ],
  "overview": "Prefecture overview (approx 100 chars in Japanese)"
}
"#;

pub const BLOCK_SEARCH: &str = r#"
You are a Data Analyst specializing in Japanese electoral research.

Analysis Date: {TODAY}
Subject: 2026 House of Representatives Election - Proportional Representation
Block: {BLOCK_NAME}
Seats: {SEATS_TOTAL}
Constituent Prefectures: {BLOCK_PREFECTURES}

Task: Analyze proportional representation conditions in {BLOCK_NAME} block.

Required Analysis:
1. Block Political Characteristics
   - Traditional party support patterns
   - Urban vs rural characteristics
   - Historical election trends

2. Party Support Status
   - Parties to analyze: {PARTY_LIST}
   - Projected vote share per party
   - Changes from previous election

3. Regional Factors
   - Key issues within the block
   - Economic conditions, demographics
   - Influence of local politicians

4. Seat Projections
   - Projected seats per party
   - Total allocation: {SEATS_TOTAL} seats

Analysis Guidelines:
- Provide substantive analysis for all sections
- Combine historical election data with current conditions
- Ensure seat projections total exactly {SEATS_TOTAL}
"#;

pub const BLOCK_SENTIMENT: &str = r#"
You are a Data Analyst examining social media sentiment.

Analysis Date: {TODAY}
Subject: 2026 House of Representatives Election - Proportional Representation
Block: {BLOCK_NAME}
Seats: {SEATS_TOTAL}
Constituent Prefectures: {BLOCK_PREFECTURES}

Task: Analyze X (Twitter) trends in {BLOCK_NAME} block.

Required Analysis:
1. Party Reactions Within Block
   - Parties to analyze: {PARTY_LIST}
   - Positive/negative ratios
   - Mention frequency trends

2. Regional Politician Visibility
   - Politicians generating discussion
   - Reactions to proportional list candidates

3. Block-Specific Political Discussion
   - Regional issue posts
   - Reactions to party policies

4. Voting Behavior Influences
   - Issues debated on social media
   - Younger voter interests

Important Considerations:
- Social media does not represent all voters
- Urban voices tend to be overrepresented
- Consider potential bot activity and coordinated campaigns

Output Requirements:
- Reference each major party
- Analyze trends objectively
"#;

pub const BLOCK_EXTRACTION: &str = r#"
You are a Data Analyst. Generate proportional block prediction JSON for {BLOCK_NAME}.

News and Survey Data:
{SEARCH_REPORT}

Social Media Analysis:
{SENTIMENT_REPORT}

Block Information:
- Block Name: {BLOCK_NAME}
- Block ID: {BLOCK_ID}
- Total Seats: {SEATS_TOTAL}
- Constituent Prefectures: {BLOCK_PREFECTURES}

Critical Constraints:
- Total seats must equal exactly {SEATS_TOTAL}
- Include all major parties (even if 0 seats)

Party ID Reference:
- Liberal Democratic Party → "ldp"
- Chudou Reform Coalition → "chudou"
- Japan Innovation Party → "ishin"
- Democratic Party for the People → "dpfp"
- Sanseito → "sanseito"
- Japanese Communist Party → "jcp"
- Reiwa Shinsengumi → "reiwa"
- Social Democratic Party → "shamin"
- Other → "other"

Synthesis Rules:
1. Integrate information from both sources
2. When sources conflict, prioritize news/survey data
3. Reference historical election results for seat allocation
4. Apply D'Hondt method logic for realistic allocations

Output JSON only:

{
  "block_id": "{BLOCK_ID}",
  "block_name": "{BLOCK_NAME}",
  "seats_total": {SEATS_TOTAL},
  "party_seats": {
    "ldp": number,
    "chudou": number,
    "ishin": number,
    "dpfp": number,
    "sanseito": number,
    "jcp": number,
    "reiwa": number,
    "shamin": number,
    "other": number
  },
  "analysis": "Block analysis (approx 100 chars in Japanese)"
}

Important: party_seats must sum to exactly {SEATS_TOTAL}.
"#;
