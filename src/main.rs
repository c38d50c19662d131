/*
 * Copyright 2023 Trevor Bentley
 *
 * Author: Trevor Bentley
 * Contact: gitsy@@trevorbentley.com
 *
 * This file is part of gitchart.
 *
 * gitchart is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * gitchart is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with gitchart.  If not, see <http://www.gnu.org/licenses/>.
 */
mod chart;
mod generate;
mod git;
mod opener;
mod settings;
mod stats;
mod template;
#[cfg(test)]
mod testutil;
mod util;

use generate::GitChartGenerator;
use settings::{GitChartCli, GitChartSettings};

fn main() {
    let cli = GitChartCli::new();
    let result = GitChartSettings::new(&cli).and_then(|settings| GitChartGenerator::new(cli, settings).generate());
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
