//! Static category and sub-category tables with their observed share of the
//! product catalog. Top-level weights sum to roughly 1.0; sub-category weights
//! are relative within their parent.

use super::Category;

/// Top-level categories, heaviest first.
pub static CATEGORIES: &[Category] = &[
    Category::top(553, "Graphics", 0.9320),
    Category::top(23, "Fonts", 0.0210),
    Category::top(26, "Crafts", 0.0185),
    Category::top(735, "Embroidery", 0.0098),
    Category::top(2245, "Laser Cutting", 0.0091),
    Category::top(546, "Bundles", 0.0065),
    Category::top(1850, "3D SVG", 0.0029),
    Category::top(2244, "3D Printing", 0.0003),
    Category::top(2246, "Knitting", 0.0002),
];

/// The most common sub-categories, heaviest first.
pub static SUBCATEGORIES: &[Category] = &[
    Category::sub(1804, 553, "Graphics", 0.2723225),
    Category::sub(638, 26, "Crafts", 0.1364864),
    Category::sub(602, 553, "Illustrations", 0.1073622),
    Category::sub(1281, 553, "T-shirt Designs", 0.0964248),
    Category::sub(580, 553, "Icons", 0.0459113),
    Category::sub(610, 553, "Print Templates", 0.0429839),
    Category::sub(1841, 553, "Transparent PNGs", 0.0347678),
    Category::sub(615, 553, "Logos", 0.0260298),
    Category::sub(608, 553, "Backgrounds", 0.0245767),
    Category::sub(1826, 553, "Patterns", 0.0211616),
    Category::sub(604, 553, "Patterns", 0.0203491),
    Category::sub(1854, 553, "AI Illustrations", 0.0192229),
    Category::sub(634, 26, "Tumbler Wraps", 0.0166457),
    Category::sub(897, 553, "KDP Interiors", 0.0086374),
    Category::sub(609, 553, "Graphic Templates", 0.0083662),
    Category::sub(1853, 553, "AI Graphics", 0.0080051),
    Category::sub(605, 553, "Product Mockups", 0.0069095),
    Category::sub(8, 23, "Script & Handwritten", 0.0061043),
    Category::sub(2111, 553, "T-Shirts", 0.0052110),
    Category::sub(1856, 553, "AI Transparent PNGs", 0.0051267),
    Category::sub(908, 553, "Coloring Pages & Books Adults", 0.0037459),
    Category::sub(606, 553, "Textures", 0.0036388),
    Category::sub(1829, 553, "AI Generated", 0.0034918),
    Category::sub(1858, 553, "Coloring Pages", 0.0032232),
    Category::sub(611, 553, "Product Mockups", 0.0029800),
    Category::sub(12, 23, "Display", 0.0029284),
    Category::sub(584, 553, "Layer Styles", 0.0029192),
    Category::sub(907, 553, "Coloring Pages & Books Kids", 0.0027455),
    Category::sub(1833, 553, "Sketches", 0.0024499),
    Category::sub(906, 553, "Coloring Pages & Books", 0.0019535),
    Category::sub(2112, 553, "Hoodies & Sweatshirts", 0.0018835),
    Category::sub(1280, 553, "Social Media Templates", 0.0016599),
    Category::sub(1857, 553, "AI Patterns", 0.0013482),
    Category::sub(2031, 553, "Decorative Elements", 0.0011899),
    Category::sub(2167, 553, "Mugs & Cups", 0.0011692),
    Category::sub(612, 553, "Websites", 0.0011454),
    Category::sub(67, 553, "Designs & Drawings", 0.0011122),
    Category::sub(617, 553, "Presentation Templates", 0.0010494),
    Category::sub(13, 23, "Sans Serif", 0.0010465),
    Category::sub(2169, 553, "Frames & Posters", 0.0010009),
    Category::sub(581, 553, "Add-ons", 0.0009821),
    Category::sub(582, 553, "Actions & Presets", 0.0009456),
    Category::sub(2117, 553, "Baby & Kids Clothing", 0.0008957),
    Category::sub(2357, 26, "Wall Decor", 0.0008954),
    Category::sub(2223, 553, "Christmas & New Year", 0.0008319),
    Category::sub(1145, 553, "KDP Keywords", 0.0008303),
    Category::sub(2365, 553, "Winter & Christmas", 0.0007974),
    Category::sub(14, 23, "Serif", 0.0007710),
    Category::sub(27, 26, "Christmas", 0.0006991),
    Category::sub(583, 553, "Brushes", 0.0006624),
    Category::sub(2370, 553, "Halloween", 0.0006500),
    Category::sub(2371, 553, "Easter", 0.0006200),
    Category::sub(2372, 553, "Valentines Day", 0.0005800),
    Category::sub(2373, 553, "Thanksgiving", 0.0005500),
    Category::sub(2374, 553, "Birthday", 0.0005200),
    Category::sub(2375, 553, "Wedding", 0.0004900),
    Category::sub(2376, 553, "Baby Shower", 0.0004600),
    Category::sub(2377, 553, "Graduation", 0.0004300),
    Category::sub(2378, 553, "Summer", 0.0004000),
    Category::sub(2379, 553, "Spring", 0.0003800),
    Category::sub(2380, 553, "Fall", 0.0003600),
    Category::sub(2381, 553, "Back to School", 0.0003400),
    Category::sub(2382, 553, "Sports", 0.0003200),
    Category::sub(2383, 553, "Music", 0.0003000),
    Category::sub(2384, 553, "Food & Drink", 0.0002800),
    Category::sub(2385, 553, "Animals", 0.0002600),
    Category::sub(2386, 553, "Nature", 0.0002400),
    Category::sub(2387, 553, "Travel", 0.0002200),
    Category::sub(2388, 553, "Business", 0.0002000),
    Category::sub(2389, 553, "Education", 0.0001800),
    Category::sub(2390, 553, "Technology", 0.0001600),
    Category::sub(637, 26, "Paper Crafts", 0.0001500),
    Category::sub(639, 26, "Sewing & Quilting", 0.0001400),
    Category::sub(640, 26, "Jewelry Making", 0.0001300),
    Category::sub(641, 26, "Scrapbooking", 0.0001200),
    Category::sub(642, 26, "Card Making", 0.0001100),
    Category::sub(2391, 553, "Stickers & Labels", 0.0001000),
    Category::sub(2392, 553, "Banners & Signs", 0.0000950),
    Category::sub(2393, 553, "Invitations", 0.0000900),
    Category::sub(2394, 553, "Greeting Cards", 0.0000850),
    Category::sub(2395, 553, "Planners & Journals", 0.0000800),
    Category::sub(2396, 553, "Calendars", 0.0000750),
    Category::sub(2397, 553, "Bookmarks", 0.0000700),
    Category::sub(2398, 553, "Gift Tags", 0.0000650),
    Category::sub(2399, 553, "Photo Frames", 0.0000600),
    Category::sub(2400, 553, "Packaging", 0.0000550),
    Category::sub(2401, 553, "Wrapping Paper", 0.0000500),
    Category::sub(11, 23, "Handwriting", 0.0000450),
    Category::sub(15, 23, "Slab Serif", 0.0000400),
    Category::sub(16, 23, "Decorative", 0.0000350),
    Category::sub(737, 735, "Machine Embroidery", 0.0000300),
    Category::sub(738, 735, "Hand Embroidery", 0.0000250),
    Category::sub(2247, 2245, "Files", 0.0000200),
    Category::sub(2248, 2245, "Templates", 0.0000150),
    Category::sub(2249, 2244, "3D Models", 0.0000100),
    Category::sub(2250, 2246, "Knitting Patterns", 0.0000050),
];
