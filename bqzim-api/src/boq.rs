//! Bill of quantities
//!
//! Expands a prediction into per-material quantities and costs, grouped by
//! construction stage. Rates are per square foot of floor area or per
//! opening (`beds + baths + garages + 2`, the 2 being kitchen and living
//! room).

use crate::model::AttributeEstimate;
use serde::{Deserialize, Serialize};

/// Share of the estimated cost attributed to labour
pub const LABOUR_RATE: f64 = 0.2;

/// Rooms present in every house besides the predicted ones
const FIXED_ROOMS: f64 = 2.0;

/// Input: the prediction response shape
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoqInput {
    #[serde(flatten)]
    pub attributes: AttributeEstimate,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoqItem {
    pub material: &'static str,
    pub unit_price: f64,
    /// Whole units to purchase
    pub quantity: i64,
    /// Rounded to whole currency units
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoqSection {
    pub name: &'static str,
    pub items: Vec<BoqItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillOfQuantities {
    pub sections: Vec<BoqSection>,
    /// Sum of unrounded material costs, rounded once at the end
    pub materials_total: i64,
    pub labour_cost: i64,
    pub estimated_cost: f64,
}

/// How a material's cost scales with the house
#[derive(Clone, Copy)]
enum Basis {
    /// `rate * square_feet / divisor`
    Area { rate: f64, divisor: f64 },
    /// `rate * openings`
    Openings { rate: f64 },
    /// Fixed cost regardless of size
    Flat { cost: f64 },
}

struct Material {
    name: &'static str,
    unit_price: f64,
    basis: Basis,
}

const fn area(name: &'static str, unit_price: f64, rate: f64, divisor: f64) -> Material {
    Material {
        name,
        unit_price,
        basis: Basis::Area { rate, divisor },
    }
}

const fn openings(name: &'static str, unit_price: f64, rate: f64) -> Material {
    Material {
        name,
        unit_price,
        basis: Basis::Openings { rate },
    }
}

const FOUNDATION: &[Material] = &[
    area("Cement", 12.0, 12.0, 9.0),
    area("Bricks", 0.20, 0.2, 0.20),
    area("Rebar", 0.75, 0.75, 10.0),
    area("Gravel", 20.0, 20.0, 20.0),
    area("Quarry Stones", 30.0, 30.0, 28.0),
    area("DPC", 10.0, 10.0, 60.0),
    area("Brick Force", 20.0, 20.0, 150.0),
    area("Anchor Bolts", 0.50, 0.50, 8.0),
];

const WALLS: &[Material] = &[
    area("Pit Sand", 20.0, 20.0, 45.0),
    area("River Sand", 20.0, 20.0, 50.0),
    area("Cement", 13.0, 13.0, 15.0),
    area("Bricks", 0.20, 0.2, 0.15),
    area("Siding Nails", 0.50, 0.5, 100.0),
    openings("Air Vents", 3.0, 3.0 * 2.0),
];

const ROOFING: &[Material] = &[
    area("Asbestos", 20.0, 20.0, 30.0),
    area("Roof Decking", 25.0, 25.0, 70.0),
    area("Ridges", 5.0, 5.0, 50.0),
    area("Roofing Nails", 10.0, 10.0, 200.0),
];

const WINDOWS_AND_DOORS: &[Material] = &[
    openings("Windows", 9.0 * 4.0, 9.0 * 4.0),
    openings("Doors", 60.0, 60.0),
    openings("Door Frames", 54.0, 54.0),
    Material {
        name: "Sliding Glass Doors",
        unit_price: 200.0,
        basis: Basis::Flat { cost: 200.0 },
    },
    openings("Window Frames", 28.0 * 2.0, 28.0 * 2.0),
];

const INTERIOR_FINISHING: &[Material] = &[
    area("Tiles", 1.0, 1.0, 10.0),
    area("Interior Paint", 25.0, 25.0, 100.0),
    area("Ceiling", 11.0, 11.0, 10.0),
];

const SECTIONS: &[(&str, &[Material])] = &[
    ("Foundation", FOUNDATION),
    ("Walls", WALLS),
    ("Roofing", ROOFING),
    ("Windows and Doors", WINDOWS_AND_DOORS),
    ("Interior Finishing", INTERIOR_FINISHING),
];

/// Compute the full bill of quantities for one prediction
pub fn calculate(input: &BoqInput) -> BillOfQuantities {
    let square_feet = input.attributes.square_feet as f64;
    // Summed in f64; the integer sum of request counts can overflow
    let openings = input.attributes.beds as f64
        + input.attributes.baths as f64
        + input.attributes.garages as f64
        + FIXED_ROOMS;

    let mut materials_total = 0.0;
    let sections = SECTIONS
        .iter()
        .map(|&(name, materials)| BoqSection {
            name,
            items: materials
                .iter()
                .map(|material| {
                    let cost = match material.basis {
                        Basis::Area { rate, divisor } => rate * square_feet / divisor,
                        Basis::Openings { rate } => rate * openings,
                        Basis::Flat { cost } => cost,
                    };
                    materials_total += cost;
                    BoqItem {
                        material: material.name,
                        unit_price: material.unit_price,
                        quantity: (cost / material.unit_price).round() as i64,
                        cost: cost.round() as i64,
                    }
                })
                .collect(),
        })
        .collect();

    BillOfQuantities {
        sections,
        materials_total: materials_total.round() as i64,
        labour_cost: (input.estimated_cost * LABOUR_RATE).round() as i64,
        estimated_cost: input.estimated_cost,
    }
}
