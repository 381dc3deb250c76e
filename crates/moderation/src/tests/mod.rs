mod bans_tests;
