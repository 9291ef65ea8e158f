// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! Render the party spread store as a self-contained HTML page with an inline
//! SVG trend chart: one line per party through the midpoints of its spread, a
//! shaded band between min and max, and the 5% electoral threshold marked.

use chrono::NaiveDate;
use survey::fields::Party;
use survey::record::format_publication_date;
use survey::spread::PartySpread;

const WIDTH : f64 = 960.0;
const HEIGHT : f64 = 540.0;
const MARGIN_LEFT : f64 = 50.0;
const MARGIN_RIGHT : f64 = 190.0; // room for the legend
const MARGIN_TOP : f64 = 50.0;
const MARGIN_BOTTOM : f64 = 60.0;

struct Plot {
    dates : Vec<NaiveDate>,
    y_max : f64,
}

impl Plot {
    fn x(&self,index:usize) -> f64 {
        let plot_width = WIDTH-MARGIN_LEFT-MARGIN_RIGHT;
        if self.dates.len()<2 { MARGIN_LEFT+plot_width/2.0 }
        else { MARGIN_LEFT+plot_width*index as f64/(self.dates.len()-1) as f64 }
    }
    fn y(&self,value:f64) -> f64 {
        let plot_height = HEIGHT-MARGIN_TOP-MARGIN_BOTTOM;
        MARGIN_TOP+plot_height*(1.0-value/self.y_max)
    }
}

/// Build the page. `data_points` limits the chart to the most recent poll
/// dates; `generated` is the human-readable timestamp shown in the title.
pub fn render(spread:&PartySpread,data_points:usize,generated:&str) -> String {
    let mut dates = spread.dates_newest_first();
    dates.truncate(data_points);
    dates.reverse(); // chronological, oldest on the left
    let mut y_max : f64 = 10.0;
    for party in spread.parties() {
        for &date in &dates {
            if let Some((_,max)) = spread.get(party,date) {
                if max>y_max { y_max=max; }
            }
        }
    }
    let y_max = (y_max/5.0).ceil()*5.0+5.0;
    let plot = Plot{dates,y_max};

    let mut svg = String::new();
    svg.push_str(&format!("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {} {}\" font-family=\"sans-serif\">\n",WIDTH,HEIGHT));
    svg.push_str(&format!("<text x=\"{}\" y=\"28\" font-size=\"20\">Sonntagsfrage (Stand: {})</text>\n",MARGIN_LEFT,generated));

    // horizontal grid with axis labels, every 5 percentage points
    let mut level = 0.0;
    while level<=plot.y_max {
        let y = plot.y(level);
        svg.push_str(&format!("<line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#cccccc\" stroke-dasharray=\"4 4\"/>\n",MARGIN_LEFT,y,WIDTH-MARGIN_RIGHT,y));
        svg.push_str(&format!("<text x=\"{}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"end\">{} %</text>\n",MARGIN_LEFT-6.0,y+4.0,level));
        level+=5.0;
    }

    // the 5% electoral threshold
    svg.push_str(&format!("<rect x=\"{}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#ff0000\" fill-opacity=\"0.12\"/>\n",
        MARGIN_LEFT,plot.y(5.0),WIDTH-MARGIN_LEFT-MARGIN_RIGHT,plot.y(0.0)-plot.y(5.0)));

    // date labels
    for (index,&date) in plot.dates.iter().enumerate() {
        svg.push_str(&format!("<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"end\" transform=\"rotate(-45 {:.1} {:.1})\">{}</text>\n",
            plot.x(index),HEIGHT-MARGIN_BOTTOM+16.0,plot.x(index),HEIGHT-MARGIN_BOTTOM+16.0,format_publication_date(date)));
    }

    // per party: min/max band, then the midpoint line on top of it
    for party in spread.parties() {
        let present : Vec<(usize,f64,f64)> = plot.dates.iter().enumerate()
            .filter_map(|(index,&date)|spread.get(party,date).map(|(min,max)|(index,min,max)))
            .collect();
        if present.is_empty() { continue; }
        if present.len()>1 {
            let mut band = String::new();
            for &(index,min,_) in &present { band.push_str(&format!("{:.1},{:.1} ",plot.x(index),plot.y(min))); }
            for &(index,_,max) in present.iter().rev() { band.push_str(&format!("{:.1},{:.1} ",plot.x(index),plot.y(max))); }
            svg.push_str(&format!("<polygon points=\"{}\" fill=\"{}\" fill-opacity=\"0.15\"/>\n",band.trim_end(),party.color()));
        }
        let line : Vec<String> = present.iter().map(|&(index,min,max)|format!("{:.1},{:.1}",plot.x(index),plot.y((min+max)/2.0))).collect();
        svg.push_str(&format!("<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",line.join(" "),party.color()));
    }

    // legend with the latest midpoint per party
    for (slot,party) in spread.parties().enumerate() {
        let y = MARGIN_TOP+18.0*slot as f64;
        let label = match spread.latest(party) {
            Some((_,min,max)) => format!("{} ({:.1} %)",party.display_name(),(min+max)/2.0),
            None => party.display_name().to_string(),
        };
        svg.push_str(&format!("<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"3\"/>\n",
            WIDTH-MARGIN_RIGHT+14.0,y,WIDTH-MARGIN_RIGHT+38.0,y,party.color()));
        svg.push_str(&format!("<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\">{}</text>\n",WIDTH-MARGIN_RIGHT+44.0,y+4.0,escape(&label)));
    }
    svg.push_str("</svg>\n");

    format!("<!DOCTYPE html>\n<html lang=\"de\">\n<head>\n<meta charset=\"utf-8\">\n<title>Sonntagsfrage</title>\n</head>\n<body>\n{}</body>\n</html>\n",svg)
}

fn escape(text:&str) -> String {
    text.replace('&',"&amp;").replace('<',"&lt;").replace('>',"&gt;")
}

#[cfg(test)]
mod tests {
    use survey::fields::Party;
    use survey::record::parse_publication_date;
    use survey::spread::PartySpread;
    use crate::page::render;

    fn date(s:&str) -> chrono::NaiveDate { parse_publication_date(s).unwrap() }

    fn sample_spread() -> PartySpread {
        let mut spread = PartySpread::new();
        for (day,cdu,spd) in [("05.01.2024",30.0,15.0),("12.01.2024",31.0,14.5),("19.01.2024",29.5,15.5)] {
            spread.observe(Party::CduCsu,date(day),cdu);
            spread.observe(Party::CduCsu,date(day),cdu+1.0);
            spread.observe(Party::Spd,date(day),spd);
        }
        spread
    }

    #[test]
    fn renders_lines_and_legend() {
        let html = render(&sample_spread(),10,"01.02.2024 12:00:00");
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("Stand: 01.02.2024 12:00:00"));
        // one line and one band per party, in the party colors
        assert!(html.contains("stroke=\"#000000\""));
        assert!(html.contains("stroke=\"#E3000F\""));
        assert!(html.contains("fill=\"#000000\" fill-opacity"));
        // legend shows the latest midpoint
        assert!(html.contains("CDU/CSU (30.0 %)"));
        assert!(html.contains("SPD (15.5 %)"));
        // all three dates are on the axis
        assert!(html.contains("05.01.2024"));
        assert!(html.contains("19.01.2024"));
    }

    #[test]
    fn limits_to_the_most_recent_dates() {
        let html = render(&sample_spread(),2,"now");
        assert!(!html.contains("05.01.2024"));
        assert!(html.contains("12.01.2024"));
        assert!(html.contains("19.01.2024"));
    }

    #[test]
    fn empty_spread_still_renders_a_page() {
        let html = render(&PartySpread::new(),10,"now");
        assert!(html.contains("</svg>"));
    }
}
