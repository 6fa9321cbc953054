// LLM-friendly documentation endpoint content.

pub const LLMS_TXT: &str = r#"# PvPDex API
> Creature collection browser with competitive (PVP) IV spread matching and team building.

## API Base URL
/api/

## Key Endpoints
- GET /api/health - Service status and loaded reference data counts
- GET /api/pvp/categories - Ranking categories (always includes "overall")
- GET /api/pvp/spreads/{number}?form=&league= - Top 10 IV spreads for a species under the league CP cap
- POST /api/collection/query - Normalize, filter, sort and annotate an uploaded collection
- GET /metrics - Prometheus metrics

## Leagues
- GL - Great League, CP cap 1500 (default)
- UL - Ultra League, CP cap 2500
- ML - Master League, CP cap 10000

## Collection query body
{ "records": <export>, "search": "", "order_by": "number", "order_dir": "asc",
  "unique": false, "dynamax": false, "gigantamax": false,
  "pvp": false, "best_teams": false, "league": "GL", "category": "overall" }

`records` accepts a list of records, a tool export `{"pokemons": [...]}`,
or a legacy wrapper `{"fileData": {...}}`.

Sort keys: number, name, cp, captured, height, weight, iv, attack, defense, stamina.

## Search syntax
- `,` or `;` - OR
- `&` - AND
- leading `!` - NOT
- `150-151`, `cp1500-`, `atk-2`, `hp100-200` - numeric ranges
- `4*`, `3*` - IV tiers
- `apex`, `shiny`, `lucky`, `shadow`, `purified`, `legendary`, `mythical`, `costume`, `dynamax`, `gigantamax` (`gmax`), `background`, `shundo`, `nundo`
- `male`, `female`, `genderunknown`, `xxs`, `xs`, `xl`, `xxl`
- `+name` - whole evolution family
- elemental type names (`dragon`, `fire`, ...)
- anything else - substring of name, number or types
"#;
