//! The address record imported by the job and its table layout.

use serde::{Deserialize, Serialize};

use crate::BatchError;

use super::flat::{DelimitedLineTokenizer, FieldSetMapper};

/// Column names of the destination table, in file order.
///
/// The order is also the token order of a line and the bind order of the
/// insert statement.
pub const ADDRESS_COLUMNS: [&str; 33] = [
    "townCode",
    "cityName",
    "cityCountryName",
    "townName",
    "roadNameCode",
    "roadName",
    "undergroundStatus",
    "buildingNum",
    "buildingSideNum",
    "zipCode",
    "buildingManagementNum",
    "buildingNameForCity",
    "buildingUseClassification",
    "administrativeTownCode",
    "administrativeTownName",
    "groundFloorNumber",
    "undergroundFloorNumber",
    "classificationApartmentBuildings",
    "buildingCnt",
    "detailBuildingName",
    "BuildingNameChangeHistory",
    "BuildingNameChangeHistoryDetail",
    "livingStatus",
    "buildingCenterXCoordinate",
    "buildingCenterYCoordinate",
    "exitXCoordinate",
    "exitYCoordinate",
    "cityNameEng",
    "cityCountryNameEng",
    "townNameEng",
    "roadNameEng",
    "townMobileClassification",
    "mobileReasonCode",
];

/// Number of `|`-separated tokens in a well-formed line.
pub const ADDRESS_FIELD_COUNT: usize = ADDRESS_COLUMNS.len();

/// One line of a building match file.
///
/// Every field is kept as the raw text of its token, possibly empty. No
/// conversion happens here; the destination schema decides the column types.
///
/// # Examples
///
/// ```
/// use address_batch::item::address::{AddressRecord, ADDRESS_FIELD_COUNT};
///
/// let mut tokens = vec![""; ADDRESS_FIELD_COUNT];
/// tokens[0] = "1111010100";
/// tokens[9] = "03154";
/// let line = tokens.join("|");
///
/// let record = AddressRecord::parse(&line).unwrap();
/// assert_eq!(record.town_code, "1111010100");
/// assert_eq!(record.zip_code, "03154");
/// assert_eq!(record.to_line('|'), line);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Legal town (beopjeong-dong) code.
    pub town_code: String,
    pub city_name: String,
    pub city_country_name: String,
    pub town_name: String,
    pub road_name_code: String,
    pub road_name: String,
    pub underground_status: String,
    pub building_num: String,
    pub building_side_num: String,
    /// Postal code.
    pub zip_code: String,
    /// Building management number, the natural key of a building in the source data.
    pub building_management_num: String,
    pub building_name_for_city: String,
    pub building_use_classification: String,
    pub administrative_town_code: String,
    pub administrative_town_name: String,
    pub ground_floor_number: String,
    pub underground_floor_number: String,
    pub classification_apartment_buildings: String,
    pub building_cnt: String,
    pub detail_building_name: String,
    pub building_name_change_history: String,
    pub building_name_change_history_detail: String,
    pub living_status: String,
    /// Building centroid, X coordinate.
    pub building_center_x_coordinate: String,
    /// Building centroid, Y coordinate.
    pub building_center_y_coordinate: String,
    /// Entrance, X coordinate.
    pub exit_x_coordinate: String,
    /// Entrance, Y coordinate.
    pub exit_y_coordinate: String,
    pub city_name_eng: String,
    pub city_country_name_eng: String,
    pub town_name_eng: String,
    pub road_name_eng: String,
    /// Change (movement) classification of the record.
    pub town_mobile_classification: String,
    /// Reason code of the change.
    pub mobile_reason_code: String,
}

impl AddressRecord {
    /// Parses one `|`-delimited line, trimmed first, with the strict width
    /// check of the job.
    pub fn parse(line: &str) -> Result<Self, BatchError> {
        let tokenizer = DelimitedLineTokenizer::new(ADDRESS_FIELD_COUNT);
        let tokens = tokenizer.tokenize(line)?;
        Ok(Self::map_field_set(&tokens))
    }

    /// Field values in column order.
    pub fn values(&self) -> [&str; ADDRESS_FIELD_COUNT] {
        [
            self.town_code.as_str(),
            self.city_name.as_str(),
            self.city_country_name.as_str(),
            self.town_name.as_str(),
            self.road_name_code.as_str(),
            self.road_name.as_str(),
            self.underground_status.as_str(),
            self.building_num.as_str(),
            self.building_side_num.as_str(),
            self.zip_code.as_str(),
            self.building_management_num.as_str(),
            self.building_name_for_city.as_str(),
            self.building_use_classification.as_str(),
            self.administrative_town_code.as_str(),
            self.administrative_town_name.as_str(),
            self.ground_floor_number.as_str(),
            self.underground_floor_number.as_str(),
            self.classification_apartment_buildings.as_str(),
            self.building_cnt.as_str(),
            self.detail_building_name.as_str(),
            self.building_name_change_history.as_str(),
            self.building_name_change_history_detail.as_str(),
            self.living_status.as_str(),
            self.building_center_x_coordinate.as_str(),
            self.building_center_y_coordinate.as_str(),
            self.exit_x_coordinate.as_str(),
            self.exit_y_coordinate.as_str(),
            self.city_name_eng.as_str(),
            self.city_country_name_eng.as_str(),
            self.town_name_eng.as_str(),
            self.road_name_eng.as_str(),
            self.town_mobile_classification.as_str(),
            self.mobile_reason_code.as_str(),
        ]
    }

    /// Serializes the record back to a delimited line, in column order.
    pub fn to_line(&self, delimiter: char) -> String {
        let separator = delimiter.to_string();
        self.values().join(separator.as_str())
    }
}

impl FieldSetMapper for AddressRecord {
    const NAMES: &'static [&'static str] = &ADDRESS_COLUMNS;

    fn map_field_set(fields: &[&str]) -> Self {
        let field = |index: usize| fields.get(index).map(|f| f.to_string()).unwrap_or_default();

        AddressRecord {
            town_code: field(0),
            city_name: field(1),
            city_country_name: field(2),
            town_name: field(3),
            road_name_code: field(4),
            road_name: field(5),
            underground_status: field(6),
            building_num: field(7),
            building_side_num: field(8),
            zip_code: field(9),
            building_management_num: field(10),
            building_name_for_city: field(11),
            building_use_classification: field(12),
            administrative_town_code: field(13),
            administrative_town_name: field(14),
            ground_floor_number: field(15),
            underground_floor_number: field(16),
            classification_apartment_buildings: field(17),
            building_cnt: field(18),
            detail_building_name: field(19),
            building_name_change_history: field(20),
            building_name_change_history_detail: field(21),
            living_status: field(22),
            building_center_x_coordinate: field(23),
            building_center_y_coordinate: field(24),
            exit_x_coordinate: field(25),
            exit_y_coordinate: field(26),
            city_name_eng: field(27),
            city_country_name_eng: field(28),
            town_name_eng: field(29),
            road_name_eng: field(30),
            town_mobile_classification: field(31),
            mobile_reason_code: field(32),
        }
    }
}
