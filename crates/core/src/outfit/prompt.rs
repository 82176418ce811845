use crate::config::RunConfig;
use crate::domain::wardrobe::WardrobeItem;
use crate::domain::weather::Weather;
use crate::outfit::exclusion::{format_wardrobe, HistoryDigest};

/// Renders the outfit prompt. Pure string templating: identical inputs always
/// produce byte-identical output, which is what makes the prompt itself
/// snapshot-testable independent of model behavior.
pub fn render(
    weather: &Weather,
    wardrobe: &[WardrobeItem],
    digest: &HistoryDigest,
    config: &RunConfig,
) -> String {
    let wardrobe_text = format_wardrobe(wardrobe);
    let location = &config.location.name;
    let recipient = &config.recipient;
    let date = &weather.date_formatted;
    let rules = &config.rules;

    format!(
        "You are helping me decide what to wear today. Style: ametora (Japanese Americana) - natural materials, muted tones, relaxed fit, pieces that age well.

<weather>
Location: {location}
Date: {date}
Local time: {local_time}
Current temperature: {temperature}°C (feels like {feels_like}°C)
Today's high: {high}°C
Conditions: {conditions}
Humidity: {humidity}%
Wind: {wind} km/h
Rain chance: {rain_now}% (current), {rain_today}% (today)
UV index: {uv}
</weather>

<wardrobe>
{wardrobe_text}
</wardrobe>
{history_block}
Give me today's outfit recommendation. Keep under {target_chars} characters for SMS. Use line breaks for readability.

IMPORTANT: Use the exact date from the weather data above (Date: {date}).

Format (use actual line breaks):
Good morning {recipient}, it is {date} in {location}.
The weather today is [today's high]°C, [humidity]% humidity, [conditions].

[Brief explanation of outfit choice based on weather + styling tip]

Top: [item]
Bottom: [item]
Shoes: [item]
Accessory: [item if appropriate]

REQUIRED: Always include Top, Bottom, and Shoes with their labels.

LAYERING OPTION: In mild weather ({layer_min}-{layer_max}°C), you can recommend a white tee as an underlayer with an unbuttoned shirt. Format as \"Top: [tee] + [shirt] (unbuttoned)\"

Example 1 (hot/humid day):
Good morning {recipient}, it is [Day Date] in {location}.
The weather today is [today's high]°C, [humidity]% humidity, [conditions].

[1-2 sentence explanation of why this outfit works for the weather + a styling tip]

Top: [breathable shirt from wardrobe]
Bottom: [lightweight pants from wardrobe]
Shoes: [appropriate footwear]
Accessory: [optional - belt or other if appropriate]

Example 2 (mild layering weather):
Good morning {recipient}, it is [Day Date] in {location}.
The weather today is [today's high]°C, [humidity]% humidity, [conditions].

[1-2 sentence explanation of layering choice + styling tip]

Top: [tee] + [shirt] (unbuttoned)
Bottom: [pants from wardrobe]
Shoes: [appropriate footwear]
Accessory: [optional - belt from wardrobe]

Example 3 (cooler weather):
Good morning {recipient}, it is [Day Date] in {location}.
The weather today is [today's high]°C, [humidity]% humidity, [conditions].

[1-2 sentence explanation of layering choice + styling tip]

Top: [shirt from wardrobe]
Bottom: [pants from wardrobe]
Shoes: [appropriate footwear]
Outer: [outer layer from wardrobe]
Accessory: [optional - belt from wardrobe]

CRITICAL: You MUST NOT recommend any top that appears in the \"DO NOT recommend\" list above. Pick a different top from the wardrobe.

COLOR COORDINATION RULES:
- NEVER pair the same shade of color for top and bottom (e.g., light blue shirt + light blue wash jeans is bad)
- Different shades of the same color family are OK (e.g., chambray + indigo denim works - light blue + dark blue)
- Create tonal contrast: light top + dark bottom OR dark top + light bottom
- Bad combos to avoid: light blue top + light blue bottoms, olive top + olive bottoms, ecru top + ecru bottoms

WEATHER RULES:
- Outer layer: Only include if temp < {outer_temp}°C
- Rain > {rain_threshold}%: Prefer boots over canvas shoes
- UV ≥ {uv_threshold}: Suggest a cap/hat

Use actual item names from my wardrobe. Plain text only, no markdown.",
        local_time = weather.local_time,
        temperature = weather.temperature_c,
        feels_like = weather.feels_like_c,
        high = weather.high_c,
        conditions = weather.conditions,
        humidity = weather.humidity_percent,
        wind = weather.wind_speed_kmh,
        rain_now = weather.rain_chance_percent,
        rain_today = weather.daily_rain_chance_percent,
        uv = weather.uv_index,
        history_block = digest.history_block,
        target_chars = config.sms.target_chars,
        layer_min = rules.layering_temp_min_c,
        layer_max = rules.layering_temp_max_c,
        outer_temp = rules.outer_layer_temp_c,
        rain_threshold = rules.rain_threshold_percent,
        uv_threshold = rules.uv_threshold,
    )
}
