//! Areas whose name changed with the 2013 delineation update.
//!
//! Names are in the cleaned vocabulary `sanitize_area_name` produces, so
//! punctuation such as `.` and `/` is already gone.

/// `(new name, old name)`.
pub(crate) const RENAMES: [(&str, &str); 30] = [
    (
        "Atlanta-Sandy Springs-Roswell, GA",
        "Atlanta-Sandy Springs-Marietta, GA",
    ),
    ("Baltimore-Columbia-Towson, MD", "Baltimore-Towson, MD"),
    (
        "Boston-Cambridge-Newton, MA-NH",
        "Boston-Cambridge-Quincy, MA-NH",
    ),
    (
        "Buffalo-Cheektowaga-Niagara Falls, NY",
        "Buffalo-Niagara Falls, NY",
    ),
    (
        "Charleston-North Charleston, SC",
        "Charleston-North Charleston-Summerville, SC",
    ),
    (
        "Charlotte-Concord-Gastonia, NC-SC",
        "Charlotte-Gastonia-Concord, NC-SC",
    ),
    (
        "Chicago-Naperville-Elgin, IL-IN-WI",
        "Chicago-Naperville-Joliet, IL-IN-WI",
    ),
    ("Cincinnati, OH-KY-IN", "Cincinnati-Middletown, OH-KY-IN"),
    ("Cleveland-Elyria, OH", "Cleveland-Elyria-Mentor, OH"),
    ("Denver-Aurora-Lakewood, CO", "Denver-Aurora, CO"),
    ("Detroit-Warren-Dearborn, MI", "Detroit-Warren-Livonia, MI"),
    (
        "Houston-The Woodlands-Sugar Land, TX",
        "Houston-Baytown-Sugar Land, TX",
    ),
    ("Indianapolis-Carmel-Anderson, IN", "Indianapolis, IN"),
    ("Las Vegas-Henderson-Paradise, NV", "Las Vegas-Paradise, NV"),
    (
        "Los Angeles-Long Beach-Anaheim, CA",
        "Los Angeles-Long Beach-Santa Ana, CA",
    ),
    (
        "LouisvilleJefferson County, KY-IN",
        "Louisville-Jefferson County, KY-IN",
    ),
    (
        "Miami-Fort Lauderdale-West Palm Beach, FL",
        "Miami-Fort Lauderdale-Miami Beach, FL",
    ),
    (
        "Nashville-Davidson--Murfreesboro--Franklin, TN",
        "Nashville-Davidson--Murfreesboro, TN",
    ),
    ("New Orleans-Metairie, LA", "New Orleans-Metairie-Kenner, LA"),
    (
        "New York-Newark-Jersey City, NY-NJ-PA",
        "New York-Northern New Jersey-Long Island, NY-NJ-PA",
    ),
    ("Orlando-Kissimmee-Sanford, FL", "Orlando, FL"),
    (
        "Portland-Vancouver-Hillsboro, OR-WA",
        "Portland-Vancouver-Beaverton, OR-WA",
    ),
    (
        "Providence-Warwick, RI-MA",
        "Providence-New Bedford-Fall River, RI-MA",
    ),
    ("Raleigh, NC", "Raleigh-Cary, NC"),
    (
        "Sacramento--Roseville--Arden-Arcade, CA",
        "Sacramento--Arden-Arcade--Roseville, CA",
    ),
    ("San Antonio-New Braunfels, TX", "San Antonio, TX"),
    ("San Diego-Carlsbad, CA", "San Diego-Carlsbad-San Marcos, CA"),
    (
        "San Francisco-Oakland-Hayward, CA",
        "San Francisco-Oakland-Fremont, CA",
    ),
    ("Urban Honolulu, HI", "Honolulu, HI"),
    ("Worcester, MA-CT", "Worcester, MA"),
];
