mod job_wiring_tests;
